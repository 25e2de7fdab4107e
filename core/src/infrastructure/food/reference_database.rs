use std::sync::Arc;

use strsim::normalized_levenshtein;
use tracing::debug;

use crate::domain::{
    common::entities::app_errors::CoreError,
    food::{
        entities::{FoodCategory, FoodReference, FoodTag},
        helpers::normalize_food_name,
        ports::FoodReferenceDatabase,
    },
};

const FUZZY_THRESHOLD: f64 = 0.8;

/// Substring matches shorter than this are too ambiguous ("鸡" is in half the catalog).
const MIN_SUBSTRING_CHARS: usize = 2;

/// Read-only reference catalog held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryFoodDatabase {
    entries: Arc<Vec<FoodReference>>,
}

impl InMemoryFoodDatabase {
    pub fn new(entries: Vec<FoodReference>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// The built-in catalog of common foods, kcal per 100 g.
    pub fn seeded() -> Self {
        Self::new(seed_catalog())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn names(entry: &FoodReference) -> impl Iterator<Item = String> + '_ {
        std::iter::once(&entry.name)
            .chain(entry.aliases.iter())
            .map(|n| normalize_food_name(n))
    }

    /// Exact name or alias, then the longest name contained in the query, then the
    /// closest name by normalized edit distance.
    pub fn find(&self, name: &str) -> Option<&FoodReference> {
        let needle = normalize_food_name(name);
        if needle.is_empty() {
            return None;
        }

        if let Some(entry) = self.entries.iter().find(|e| e.matches_name(&needle)) {
            return Some(entry);
        }

        let contained = self
            .entries
            .iter()
            .filter_map(|entry| {
                Self::names(entry)
                    .filter(|n| n.chars().count() >= MIN_SUBSTRING_CHARS && needle.contains(n.as_str()))
                    .map(|n| n.chars().count())
                    .max()
                    .map(|len| (len, entry))
            })
            .max_by(|(a, ea), (b, eb)| a.cmp(b).then_with(|| eb.id.cmp(&ea.id)));
        if let Some((_, entry)) = contained {
            debug!(query = %needle, matched = %entry.name, "substring match");
            return Some(entry);
        }

        let fuzzy = self
            .entries
            .iter()
            .filter_map(|entry| {
                Self::names(entry)
                    .map(|n| normalized_levenshtein(&needle, &n))
                    .reduce(f64::max)
                    .map(|score| (score, entry))
            })
            .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
            .max_by(|(a, ea), (b, eb)| a.total_cmp(b).then_with(|| eb.id.cmp(&ea.id)));
        if let Some((score, entry)) = fuzzy {
            debug!(query = %needle, matched = %entry.name, score, "fuzzy match");
            return Some(entry);
        }

        None
    }
}

impl Default for InMemoryFoodDatabase {
    fn default() -> Self {
        Self::seeded()
    }
}

impl FoodReferenceDatabase for InMemoryFoodDatabase {
    async fn lookup(&self, name: String) -> Result<Option<FoodReference>, CoreError> {
        Ok(self.find(&name).cloned())
    }

    async fn catalog(&self) -> Result<Vec<FoodReference>, CoreError> {
        Ok(self.entries.as_ref().clone())
    }
}

fn entry(
    id: &str,
    name: &str,
    aliases: &[&str],
    calories: f64,
    category: FoodCategory,
    tags: &[FoodTag],
    popularity: f64,
) -> FoodReference {
    FoodReference {
        id: id.to_string(),
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        calories,
        category,
        tags: tags.to_vec(),
        popularity,
    }
}

fn seed_catalog() -> Vec<FoodReference> {
    use FoodCategory::*;
    use FoodTag::*;

    vec![
        entry("rice", "rice", &["米饭", "white rice", "steamed rice"], 130.0, Staple, &[Light], 0.95),
        entry("noodles", "noodles", &["面条", "noodle"], 110.0, Staple, &[Light], 0.85),
        entry("steamed-bun", "steamed bun", &["馒头", "mantou"], 221.0, Staple, &[Light], 0.7),
        entry("baozi", "baozi", &["包子", "stuffed bun"], 250.0, Staple, &[Savory, FoodTag::Protein], 0.7),
        entry("dumplings", "dumplings", &["饺子", "dumpling", "jiaozi"], 250.0, Staple, &[Savory, FoodTag::Protein], 0.75),
        entry("bread", "bread", &["面包"], 250.0, Staple, &[VitaminB], 0.65),
        entry("sweet-potato", "sweet potato", &["红薯", "地瓜"], 86.0, Staple, &[Fiber, VitaminB, Sweet], 0.45),
        entry("corn", "corn", &["玉米"], 86.0, Staple, &[Fiber, Sweet], 0.45),
        entry("oatmeal", "oatmeal", &["燕麦", "燕麦粥", "oats"], 68.0, Staple, &[Fiber, Magnesium, Iron], 0.5),
        entry("egg", "egg", &["鸡蛋", "eggs", "boiled egg"], 155.0, FoodCategory::Protein, &[FoodTag::Protein, VitaminB, Zinc], 0.9),
        entry("tofu", "tofu", &["豆腐", "bean curd"], 76.0, FoodCategory::Protein, &[FoodTag::Protein, Calcium, Iron], 0.6),
        entry("fish", "fish", &["鱼肉", "鱼"], 206.0, FoodCategory::Protein, &[FoodTag::Protein, VitaminB, Zinc], 0.6),
        entry("chicken", "chicken", &["鸡肉", "chicken breast", "鸡胸肉"], 165.0, FoodCategory::Protein, &[FoodTag::Protein, VitaminB], 0.65),
        entry("fried-chicken", "fried chicken", &["炸鸡"], 290.0, FoodCategory::Protein, &[FoodTag::Protein, Fried, Savory], 0.5),
        entry("lean-pork", "lean pork", &["瘦肉", "猪肉", "pork"], 250.0, FoodCategory::Protein, &[FoodTag::Protein, Iron, Zinc, Savory], 0.55),
        entry("beef", "beef", &["牛肉"], 250.0, FoodCategory::Protein, &[FoodTag::Protein, Iron, Zinc, Savory], 0.55),
        entry("greens", "leafy greens", &["青菜", "greens", "bok choy"], 25.0, Vegetable, &[Fiber, VitaminC, Folate, Light], 0.6),
        entry("spinach", "spinach", &["菠菜"], 23.0, Vegetable, &[Iron, Folate, Magnesium, Fiber], 0.45),
        entry("tomato", "tomato", &["西红柿", "番茄", "tomatoes"], 18.0, Vegetable, &[VitaminC, Sour], 0.6),
        entry("cucumber", "cucumber", &["黄瓜"], 15.0, Vegetable, &[Light], 0.4),
        entry("carrot", "carrot", &["胡萝卜", "carrots"], 41.0, Vegetable, &[Fiber, Sweet], 0.4),
        entry("potato", "potato", &["土豆", "马铃薯", "potatoes"], 77.0, Vegetable, &[Fiber, Savory], 0.55),
        entry("broccoli", "broccoli", &["西兰花", "西蓝花"], 34.0, Vegetable, &[VitaminC, Fiber, Folate, Calcium], 0.5),
        entry("apple", "apple", &["苹果", "apples"], 52.0, Fruit, &[Fiber, VitaminC, Sweet], 0.8),
        entry("banana", "banana", &["香蕉", "bananas"], 89.0, Fruit, &[Magnesium, Fiber, Sweet], 0.75),
        entry("orange", "orange", &["橙子", "oranges"], 47.0, Fruit, &[VitaminC, Folate, Sour], 0.6),
        entry("grapes", "grapes", &["葡萄", "grape"], 67.0, Fruit, &[Sweet], 0.45),
        entry("strawberry", "strawberry", &["草莓", "strawberries"], 32.0, Fruit, &[VitaminC, Sweet], 0.5),
        entry("milk", "milk", &["牛奶", "whole milk"], 60.0, Dairy, &[Calcium, FoodTag::Protein], 0.8),
        entry("yogurt", "yogurt", &["酸奶", "yoghurt"], 59.0, Dairy, &[Calcium, FoodTag::Protein, Sour], 0.65),
        entry("soy-milk", "soy milk", &["豆浆", "soymilk"], 31.0, Drink, &[FoodTag::Protein, Calcium, Light], 0.6),
        entry("nuts", "mixed nuts", &["坚果", "nuts"], 607.0, Snack, &[Magnesium, Zinc], 0.4),
        entry("red-dates", "red dates", &["红枣", "jujube"], 264.0, Snack, &[Iron, Sweet], 0.35),
        entry("dark-chocolate", "dark chocolate", &["黑巧克力"], 546.0, Snack, &[Magnesium, Iron, Sweet], 0.3),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exact_and_alias_lookup() {
        let db = InMemoryFoodDatabase::seeded();

        let apple = db.lookup("Apple".to_string()).await.unwrap().unwrap();
        assert_eq!(apple.id, "apple");
        assert_eq!(apple.calories, 52.0);

        let rice = db.lookup("米饭".to_string()).await.unwrap().unwrap();
        assert_eq!(rice.id, "rice");
    }

    #[test]
    fn test_substring_prefers_longest_name() {
        let db = InMemoryFoodDatabase::seeded();
        assert_eq!(db.find("crispy fried chicken").unwrap().id, "fried-chicken");
        assert_eq!(db.find("红烧牛肉").unwrap().id, "beef");
    }

    #[test]
    fn test_fuzzy_match_tolerates_typos() {
        let db = InMemoryFoodDatabase::seeded();
        assert_eq!(db.find("brocoli").unwrap().id, "broccoli");
        assert!(db.find("xyz").is_none());
        assert!(db.find("   ").is_none());
    }

    #[tokio::test]
    async fn test_catalog_is_complete_and_sane() {
        let db = InMemoryFoodDatabase::seeded();
        let catalog = db.catalog().await.unwrap();
        assert_eq!(catalog.len(), db.len());
        assert!(catalog.iter().all(|e| e.calories >= 0.0));
        assert!(catalog.iter().all(|e| (0.0..=1.0).contains(&e.popularity)));
    }
}
