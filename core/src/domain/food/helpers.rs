/// Case and whitespace insensitive form of a food name, used as a grouping key.
pub fn normalize_food_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Relative-or-absolute closeness check for two calorie values.
pub fn calories_agree(a: f64, b: f64, relative_tolerance: f64) -> bool {
    let scale = a.abs().max(b.abs());
    (a - b).abs() <= (scale * relative_tolerance).max(1.0)
}
