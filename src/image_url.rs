pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/original";

/// Fully-qualified TMDB image URL for a relative path such as `/abc.jpg`.
pub fn tmdb(path: &str) -> String {
    format!("{TMDB_IMAGE_BASE}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_relative_path_with_image_base() {
        assert_eq!(
            tmdb("/kXfqcdQKsToO0OUXHcrrNCHDBzO.jpg"),
            "https://image.tmdb.org/t/p/original/kXfqcdQKsToO0OUXHcrrNCHDBzO.jpg"
        );
    }

    #[test]
    fn empty_path_yields_bare_base() {
        assert_eq!(tmdb(""), TMDB_IMAGE_BASE);
    }
}
