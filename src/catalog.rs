//! Supplier catalog feed: the YAML document a shop uploads to replace its
//! listings.
//!
//! ```yaml
//! shop: Связной
//! categories:
//!   - id: 224
//!     name: Смартфоны
//! goods:
//!   - id: 4216292
//!     category: 224
//!     model: apple/iphone/xs-max
//!     name: Смартфон Apple iPhone XS Max 512GB (золотистый)
//!     price: 110000
//!     price_rrc: 116990
//!     quantity: 14
//!     parameters:
//!       "Диагональ (дюйм)": 6.5
//!       Цвет: золотистый
//! ```

use std::{collections::BTreeMap, collections::HashSet, fmt};

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Upper bound for `price` and `price_rrc`.
pub const MAX_PRICE: i64 = 1_000_000_000;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ShopCatalog {
    pub shop: String,
    #[serde(default)]
    pub categories: Vec<CatalogCategory>,
    #[serde(default)]
    pub goods: Vec<CatalogGood>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogGood {
    /// Supplier-side article number; informational only.
    pub id: Option<i64>,
    pub name: String,
    pub category: i64,
    #[serde(default)]
    pub model: String,
    pub price: i64,
    pub price_rrc: i64,
    pub quantity: i32,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
}

/// Parameter values are free-form YAML scalars and are stored as text.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Int(v) => write!(f, "{v}"),
            ParameterValue::Float(v) => write!(f, "{v}"),
            ParameterValue::Bool(v) => write!(f, "{v}"),
            ParameterValue::Text(v) => f.write_str(v),
        }
    }
}

/// Parse a feed and run the semantic checks that must pass before any write.
pub fn parse_catalog(raw: &[u8]) -> AppResult<ShopCatalog> {
    let catalog: ShopCatalog =
        serde_yaml::from_slice(raw).map_err(|err| AppError::Parse(err.to_string()))?;
    catalog.validate()?;
    Ok(catalog)
}

impl ShopCatalog {
    pub fn validate(&self) -> AppResult<()> {
        if self.shop.trim().is_empty() {
            return Err(AppError::Parse("не указано название магазина".into()));
        }

        let known: HashSet<i64> = self.categories.iter().map(|c| c.id).collect();
        for good in &self.goods {
            if !known.contains(&good.category) {
                return Err(AppError::Parse(format!(
                    "товар \"{}\" ссылается на неизвестную категорию {}",
                    good.name, good.category
                )));
            }
            if good.price < 0 || good.price_rrc < 0 || good.quantity < 0 {
                return Err(AppError::Parse(format!(
                    "у товара \"{}\" отрицательная цена или количество",
                    good.name
                )));
            }
            if good.price > MAX_PRICE || good.price_rrc > MAX_PRICE {
                return Err(AppError::Parse(format!(
                    "у товара \"{}\" цена больше {MAX_PRICE}",
                    good.name
                )));
            }
        }
        Ok(())
    }

    pub fn parameter_count(&self) -> usize {
        self.goods.iter().map(|g| g.parameters.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"
shop: Связной
categories:
  - id: 224
    name: Смартфоны
  - id: 15
    name: Аксессуары
goods:
  - id: 4216292
    category: 224
    model: apple/iphone/xs-max
    name: Смартфон Apple iPhone XS Max 512GB (золотистый)
    price: 110000
    price_rrc: 116990
    quantity: 14
    parameters:
      "Диагональ (дюйм)": 6.5
      "Встроенная память (Гб)": 512
      Цвет: золотистый
  - category: 15
    name: Чехол
    price: 500
    price_rrc: 700
    quantity: 3
"#;

    #[test]
    fn parses_feed_with_mixed_parameter_scalars() {
        let catalog = parse_catalog(FEED.as_bytes()).expect("valid feed");
        assert_eq!(catalog.shop, "Связной");
        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.goods.len(), 2);
        assert_eq!(catalog.parameter_count(), 3);

        let phone = &catalog.goods[0];
        assert_eq!(phone.parameters["Диагональ (дюйм)"].to_string(), "6.5");
        assert_eq!(phone.parameters["Встроенная память (Гб)"].to_string(), "512");
        assert_eq!(phone.parameters["Цвет"].to_string(), "золотистый");

        let case = &catalog.goods[1];
        assert_eq!(case.id, None);
        assert_eq!(case.model, "");
        assert!(case.parameters.is_empty());
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = parse_catalog(b"shop: [unclosed").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let err = parse_catalog(b"categories: []\ngoods: []\n").unwrap_err();
        assert!(matches!(err, AppError::Parse(msg) if msg.contains("shop")));
    }

    #[test]
    fn rejects_goods_in_unlisted_category() {
        let feed = r#"
shop: S
categories:
  - id: 1
    name: A
goods:
  - category: 2
    name: X
    price: 1
    price_rrc: 1
    quantity: 1
"#;
        let err = parse_catalog(feed.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Parse(msg) if msg.contains("2")));
    }

    #[test]
    fn rejects_negative_stock() {
        let feed = r#"
shop: S
categories:
  - id: 1
    name: A
goods:
  - category: 1
    name: X
    price: 10
    price_rrc: 10
    quantity: -1
"#;
        assert!(matches!(
            parse_catalog(feed.as_bytes()),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn rejects_prices_above_the_cap() {
        let feed = format!(
            "shop: S\ncategories:\n  - id: 1\n    name: A\ngoods:\n  - category: 1\n    name: X\n    price: {}\n    price_rrc: 10\n    quantity: 1\n",
            i64::MAX
        );
        assert!(matches!(
            parse_catalog(feed.as_bytes()),
            Err(AppError::Parse(msg)) if msg.contains("цена")
        ));

        let at_cap = feed.replace(&i64::MAX.to_string(), &MAX_PRICE.to_string());
        assert!(parse_catalog(at_cap.as_bytes()).is_ok());
    }
}
