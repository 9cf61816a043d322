//! # Utility Functions Module
//!
//! Small helpers shared by the plugins and the batch summary.

/// Converts a list of string-like items to `Vec<String>`.
///
/// Used to build external tool argument lists without repeating `.to_string()`.
///
/// # Example
/// ```rust
/// use image2min::utils::to_string_vec;
///
/// let level = 3;
/// let args = to_string_vec(["-strip", "all", &format!("-o{}", level)]);
/// assert_eq!(args, vec!["-strip", "all", "-o3"]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Pluralizes an English noun for a count (`image` -> `images`).
pub fn plural(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string_vec_mixed_types() {
        let level = 7;
        let result = to_string_vec(["-o", &level.to_string(), "-strip"]);
        assert_eq!(result, vec!["-o".to_string(), "7".to_string(), "-strip".to_string()]);
    }

    #[test]
    fn test_to_string_vec_empty() {
        let result: Vec<String> = to_string_vec(Vec::<&str>::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural("image", 1), "image");
        assert_eq!(plural("image", 0), "images");
        assert_eq!(plural("image", 2), "images");
    }
}
