//! Static category → keyword table and the ordered source-site list.
//!
//! Probe order is keyword-major: every site is tried for a keyword before
//! the sweep moves to the next keyword. Order is deterministic and
//! meaningful — earlier keywords are the historically higher-yield ones.

/// Ordered keyword list for a category. Unknown categories fall back to
/// searching the category name itself.
pub fn keywords_for(category: &str) -> Vec<String> {
    let keywords: Vec<&str> = match category {
        "tech" => vec![
            "laptop clearance",
            "headset discount",
            "ssd price error",
            "monitor open box",
            "smartphone flash sale",
        ],
        "gaming" => vec![
            "console bundle price",
            "gpu clearance",
            "gaming chair discount",
            "controller flash sale",
        ],
        "home" => vec![
            "vacuum price drop",
            "espresso machine clearance",
            "air fryer discount",
            "cookware set sale",
        ],
        "fashion" => vec![
            "sneakers clearance",
            "jacket outlet price",
            "watch flash sale",
        ],
        other => vec![other],
    };
    keywords.into_iter().map(str::to_string).collect()
}

/// Ordered list of source sites every keyword is probed against.
pub fn site_list() -> Vec<String> {
    ["amazon.fr", "cdiscount.com", "fnac.com", "darty.com", "rakuten.fr"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
