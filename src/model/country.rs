use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub population: i64,
    pub gdp_per_capita: f64,
    pub government_type: Option<String>,
    pub capital: Option<String>,
    pub continent: Option<String>,
    pub internal_stability: f64,
    pub border_security: f64,
}

/// Country-shaped record produced by the wiki infobox extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CountryRecord {
    pub name: String,
    pub capital: Option<String>,
    pub population: Option<i64>,
    pub gdp_per_capita: Option<f64>,
    pub government_type: Option<String>,
    pub continent: Option<String>,
}
