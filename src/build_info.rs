//! Compile-time build information, stamped by `build.rs`.

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_not_empty() {
        assert!(!BUILD_COMMIT.is_empty());
        assert!(!BUILD_DATE.is_empty());
    }

    #[test]
    fn test_build_date_format() {
        // YYYY-MM-DD
        assert!(BUILD_DATE.len() == 10 || BUILD_DATE == "unknown");
    }
}
