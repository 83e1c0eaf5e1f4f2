/// Derive a URL slug from a product name: ASCII-lowercased, with every run
/// of non-alphanumeric characters collapsed into a single dash.
///
/// Names that slugify to nothing fall back to "product" so the unique
/// suffix loop in the catalog service still has a base to work with.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "product".to_string()
    } else {
        slug
    }
}

/// Candidate for the n-th collision of `base`.
pub fn with_suffix(base: &str, counter: u32) -> String {
    format!("{base}-{counter}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies_names() {
        assert_eq!(slugify("Golden Penny Semovita 1kg"), "golden-penny-semovita-1kg");
        assert_eq!(slugify("  Peak Milk -- Tin  "), "peak-milk-tin");
        assert_eq!(slugify("Coke (50cl)"), "coke-50cl");
    }

    #[test]
    fn empty_names_fall_back() {
        assert_eq!(slugify("★★★"), "product");
        assert_eq!(slugify(""), "product");
    }

    #[test]
    fn collision_suffixes() {
        assert_eq!(with_suffix("coke-50cl", 1), "coke-50cl-1");
        assert_eq!(with_suffix("coke-50cl", 2), "coke-50cl-2");
    }
}
