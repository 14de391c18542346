//! Enumerations shared by several flows.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Who the garden feeds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GardenVariant {
    /// A household garden.
    Family,
    /// A school or community garden feeding a group.
    Community,
}

/// Nutritional focus of the garden.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DietaryNeed {
    General,
    IronRich,
    VitaminA,
    ChildHealth,
    MaternalHealth,
}

impl DietaryNeed {
    /// Returns the short label shown to users.
    pub fn label(self) -> &'static str {
        match self {
            Self::General => "General Nutrition",
            Self::IronRich => "Iron-Rich Boost",
            Self::VitaminA => "Vitamin A Boost",
            Self::ChildHealth => "Child Health (U5)",
            Self::MaternalHealth => "Maternal Health",
        }
    }

    /// Returns the nutritional goal written into prompts.
    pub fn goal(self) -> &'static str {
        match self {
            Self::General => "A balanced mix of essential vitamins and minerals for overall health.",
            Self::IronRich => {
                "Focus on iron-rich crops to help combat anemia and boost energy levels."
            }
            Self::VitaminA => {
                "Focus on crops rich in Vitamin A to support vision and immune function."
            }
            Self::ChildHealth => {
                "Crops that provide key nutrients for growth and development in children under 5."
            }
            Self::MaternalHealth => {
                "Nutrient-dense crops to support the health of pregnant and lactating mothers."
            }
        }
    }
}

/// Water source or planting location.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumIter, EnumString,
)]
pub enum WaterAvailability {
    #[serde(rename = "rainfed")]
    #[strum(serialize = "rainfed")]
    Rainfed,
    #[serde(rename = "irrigated")]
    #[strum(serialize = "irrigated")]
    Irrigated,
    #[serde(rename = "sack/bag garden")]
    #[strum(serialize = "sack/bag garden")]
    SackGarden,
    #[serde(rename = "balcony garden")]
    #[strum(serialize = "balcony garden")]
    BalconyGarden,
}

/// Calendar month, as written in English.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumIter, EnumString,
)]
pub enum PlantingMonth {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

/// Schema accepting exactly the string forms of `T`.
pub(crate) fn enum_schema<T>() -> Value
where
    T: IntoEnumIterator + AsRef<str>,
{
    let values: Vec<Value> = T::iter().map(|v| Value::from(v.as_ref())).collect();
    json!({ "type": "string", "enum": values })
}

/// Like [`enum_schema`], but also accepting `null`.
pub(crate) fn nullable_enum_schema<T>() -> Value
where
    T: IntoEnumIterator + AsRef<str>,
{
    let mut values: Vec<Value> = T::iter().map(|v| Value::from(v.as_ref())).collect();
    values.push(Value::Null);
    json!({ "type": ["string", "null"], "enum": values })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_and_strum_agree() {
        for need in DietaryNeed::iter() {
            assert_eq!(serde_json::to_value(need).unwrap(), json!(need.as_ref()));
        }
        for water in WaterAvailability::iter() {
            assert_eq!(serde_json::to_value(water).unwrap(), json!(water.as_ref()));
        }
        for month in PlantingMonth::iter() {
            assert_eq!(serde_json::to_value(month).unwrap(), json!(month.as_ref()));
        }
        assert_eq!(DietaryNeed::VitaminA.as_ref(), "vitamin_a");
    }

    #[test]
    fn builds_enum_schemas() {
        let schema = enum_schema::<WaterAvailability>();
        assert_eq!(
            schema["enum"],
            json!(["rainfed", "irrigated", "sack/bag garden", "balcony garden"])
        );
        let nullable = nullable_enum_schema::<GardenVariant>();
        assert_eq!(nullable["enum"], json!(["family", "community", null]));
    }
}
