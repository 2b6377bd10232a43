//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn email() -> String {
        "user@noreply.kasane".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn templates() -> PathBuf {
        "template".into()
    }

    pub fn layouts() -> PathBuf {
        "_layouts".into()
    }

    pub fn posts() -> PathBuf {
        "_posts".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn extension() -> String {
        "sx".into()
    }

    pub fn post_url() -> String {
        "/{year}/{month}/{slug}.html".into()
    }

    pub fn tag_layout() -> String {
        "tag".into()
    }

    pub fn tag_url() -> String {
        "/tag/{tag}.html".into()
    }
}
