use serde::{Deserialize, Deserializer};

// /carros/marcas                         -> [Brand]
// /carros/marcas/{b}/modelos             -> { modelos: [CatalogModel], anos: [...] }
// /carros/marcas/{b}/modelos/{m}/anos    -> [ModelYear]   ("2020 Gasolina", "32000 Diesel")
// /carros/marcas/{b}/modelos/{m}/anos/{y}-> PriceQuote    ({ "Valor": "R$ 90.000,00", ... })

#[derive(Debug, Clone, Deserialize)]
pub struct Brand {
    #[serde(deserialize_with = "code_from_any")]
    pub codigo: String,
    pub nome: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogModel {
    #[serde(deserialize_with = "code_from_any")]
    pub codigo: String,
    pub nome: String,
}

#[derive(Debug, Deserialize)]
pub struct ModelsResponse {
    pub modelos: Vec<CatalogModel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelYear {
    #[serde(deserialize_with = "code_from_any")]
    pub codigo: String,
    pub nome: String,
}

impl ModelYear {
    /// Leading year of the label, when it is all digits ("2020 Gasolina" -> "2020").
    pub fn year_prefix(&self) -> Option<&str> {
        let first = self.nome.split(' ').next()?;
        (!first.is_empty() && first.chars().all(|c| c.is_ascii_digit())).then_some(first)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceQuote {
    #[serde(rename = "Valor")]
    pub valor: String,
    #[serde(rename = "Modelo", default)]
    pub modelo: Option<String>,
    #[serde(rename = "AnoModelo", default)]
    pub ano_modelo: Option<i32>,
}

/// Catalog codes arrive as numbers on some endpoints and strings on others.
fn code_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Num(i64),
        Text(String),
    }

    Ok(match Code::deserialize(deserializer)? {
        Code::Num(n) => n.to_string(),
        Code::Text(s) => s,
    })
}
