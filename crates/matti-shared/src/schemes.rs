//! Government schemes relevant to smallholder farmers.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Scheme {
    pub name: &'static str,
    pub description: &'static str,
    pub benefit: &'static str,
}

pub const SCHEMES: &[Scheme] = &[
    Scheme {
        name: "PM-Kisan Samman Nidhi",
        description: "Financial support to all landholding farmer families in the country.",
        benefit: "₹6,000 per year",
    },
    Scheme {
        name: "Rythu Bandhu Scheme (Telangana)",
        description: "A grant for inputs like seeds, fertilizers, pesticides and labour for each farmer.",
        benefit: "₹5,000 per acre per season",
    },
    Scheme {
        name: "Pradhan Mantri Fasal Bima Yojana (PMFBY)",
        description: "Insurance cover for farmers against failure of the crop.",
        benefit: "Insurance Cover",
    },
];
