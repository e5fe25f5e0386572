/// Title-case a string: the first letter of every alphabetic run is
/// uppercased and the rest lowercased.
///
/// # Examples
/// ```
/// use noise_processor::utils::title_case;
///
/// assert_eq!(title_case("STATEN ISLAND"), "Staten Island");
/// assert_eq!(title_case("n/a"), "N/A");
/// ```
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;

    for ch in input.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("brooklyn"), "Brooklyn");
        assert_eq!(title_case("MANHATTAN"), "Manhattan");
        assert_eq!(title_case("staten island"), "Staten Island");
        assert_eq!(title_case("UNSPECIFIED"), "Unspecified");
        assert_eq!(title_case("o'neil"), "O'Neil");
        assert_eq!(title_case(""), "");
    }
}
