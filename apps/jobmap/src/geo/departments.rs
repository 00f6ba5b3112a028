//! Static table of French departments: official name and a representative centroid.
//!
//! Centroids are low-precision fallbacks (two decimals, roughly 1 km) used when a
//! listing only carries a department code or its commune cannot be found locally.

use crate::geo::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Department {
    pub code: &'static str,
    pub name: &'static str,
    pub centroid: Coordinates,
}

const fn dept(code: &'static str, name: &'static str, lat: f64, lon: f64) -> Department {
    Department {
        code,
        name,
        centroid: Coordinates::new(lat, lon),
    }
}

pub const DEPARTMENTS: &[Department] = &[
    dept("01", "Ain", 46.07, 5.35),
    dept("02", "Aisne", 49.56, 3.56),
    dept("03", "Allier", 46.39, 3.19),
    dept("04", "Alpes-de-Haute-Provence", 44.10, 6.24),
    dept("05", "Hautes-Alpes", 44.66, 6.26),
    dept("06", "Alpes-Maritimes", 43.94, 7.12),
    dept("07", "Ardèche", 44.75, 4.42),
    dept("08", "Ardennes", 49.62, 4.64),
    dept("09", "Ariège", 42.92, 1.50),
    dept("10", "Aube", 48.30, 4.16),
    dept("11", "Aude", 43.10, 2.41),
    dept("12", "Aveyron", 44.28, 2.68),
    dept("13", "Bouches-du-Rhône", 43.54, 5.09),
    dept("14", "Calvados", 49.10, -0.36),
    dept("15", "Cantal", 45.05, 2.67),
    dept("16", "Charente", 45.72, 0.20),
    dept("17", "Charente-Maritime", 45.78, -0.67),
    dept("18", "Cher", 47.06, 2.49),
    dept("19", "Corrèze", 45.36, 1.88),
    dept("2A", "Corse-du-Sud", 41.86, 8.98),
    dept("2B", "Haute-Corse", 42.39, 9.21),
    dept("21", "Côte-d'Or", 47.42, 4.77),
    dept("22", "Côtes-d'Armor", 48.44, -2.86),
    dept("23", "Creuse", 46.09, 2.02),
    dept("24", "Dordogne", 45.10, 0.74),
    dept("25", "Doubs", 47.17, 6.36),
    dept("26", "Drôme", 44.68, 5.17),
    dept("27", "Eure", 49.11, 0.99),
    dept("28", "Eure-et-Loir", 48.39, 1.37),
    dept("29", "Finistère", 48.26, -4.06),
    dept("30", "Gard", 43.99, 4.18),
    dept("31", "Haute-Garonne", 43.36, 1.17),
    dept("32", "Gers", 43.69, 0.45),
    dept("33", "Gironde", 44.82, -0.57),
    dept("34", "Hérault", 43.58, 3.37),
    dept("35", "Ille-et-Vilaine", 48.15, -1.64),
    dept("36", "Indre", 46.78, 1.58),
    dept("37", "Indre-et-Loire", 47.26, 0.69),
    dept("38", "Isère", 45.26, 5.58),
    dept("39", "Jura", 46.73, 5.70),
    dept("40", "Landes", 43.97, -0.78),
    dept("41", "Loir-et-Cher", 47.62, 1.43),
    dept("42", "Loire", 45.73, 4.17),
    dept("43", "Haute-Loire", 45.13, 3.81),
    dept("44", "Loire-Atlantique", 47.36, -1.68),
    dept("45", "Loiret", 47.91, 2.34),
    dept("46", "Lot", 44.62, 1.60),
    dept("47", "Lot-et-Garonne", 44.37, 0.46),
    dept("48", "Lozère", 44.52, 3.50),
    dept("49", "Maine-et-Loire", 47.39, -0.56),
    dept("50", "Manche", 49.08, -1.33),
    dept("51", "Marne", 48.95, 4.24),
    dept("52", "Haute-Marne", 48.11, 5.23),
    dept("53", "Mayenne", 48.15, -0.66),
    dept("54", "Meurthe-et-Moselle", 48.79, 6.16),
    dept("55", "Meuse", 48.99, 5.38),
    dept("56", "Morbihan", 47.85, -2.81),
    dept("57", "Moselle", 49.04, 6.66),
    dept("58", "Nièvre", 47.11, 3.50),
    dept("59", "Nord", 50.45, 3.22),
    dept("60", "Oise", 49.41, 2.43),
    dept("61", "Orne", 48.62, 0.13),
    dept("62", "Pas-de-Calais", 50.49, 2.29),
    dept("63", "Puy-de-Dôme", 45.73, 3.14),
    dept("64", "Pyrénées-Atlantiques", 43.26, -0.76),
    dept("65", "Hautes-Pyrénées", 43.05, 0.16),
    dept("66", "Pyrénées-Orientales", 42.60, 2.52),
    dept("67", "Bas-Rhin", 48.67, 7.55),
    dept("68", "Haut-Rhin", 47.86, 7.27),
    dept("69", "Rhône", 45.88, 4.64),
    dept("70", "Haute-Saône", 47.64, 6.09),
    dept("71", "Saône-et-Loire", 46.64, 4.54),
    dept("72", "Sarthe", 47.99, 0.22),
    dept("73", "Savoie", 45.48, 6.44),
    dept("74", "Haute-Savoie", 46.03, 6.43),
    dept("75", "Paris", 48.86, 2.35),
    dept("76", "Seine-Maritime", 49.66, 1.03),
    dept("77", "Seine-et-Marne", 48.63, 2.93),
    dept("78", "Yvelines", 48.82, 1.84),
    dept("79", "Deux-Sèvres", 46.56, -0.32),
    dept("80", "Somme", 49.96, 2.28),
    dept("81", "Tarn", 43.79, 2.17),
    dept("82", "Tarn-et-Garonne", 44.08, 1.28),
    dept("83", "Var", 43.46, 6.22),
    dept("84", "Vaucluse", 44.01, 5.18),
    dept("85", "Vendée", 46.67, -1.30),
    dept("86", "Vienne", 46.56, 0.46),
    dept("87", "Haute-Vienne", 45.89, 1.24),
    dept("88", "Vosges", 48.20, 6.38),
    dept("89", "Yonne", 47.84, 3.56),
    dept("90", "Territoire de Belfort", 47.63, 6.93),
    dept("91", "Essonne", 48.52, 2.24),
    dept("92", "Hauts-de-Seine", 48.85, 2.25),
    dept("93", "Seine-Saint-Denis", 48.91, 2.48),
    dept("94", "Val-de-Marne", 48.78, 2.47),
    dept("95", "Val-d'Oise", 49.08, 2.13),
    dept("971", "Guadeloupe", 16.20, -61.55),
    dept("972", "Martinique", 14.64, -61.02),
    dept("973", "Guyane", 3.93, -53.13),
    dept("974", "La Réunion", -21.13, 55.53),
    dept("976", "Mayotte", -12.82, 45.15),
];

/// Looks up a department by code. Single-digit codes are zero-padded ("1" → "01").
pub fn find(code: &str) -> Option<&'static Department> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    let padded = if code.len() == 1 {
        format!("0{code}")
    } else {
        code.to_uppercase()
    };
    DEPARTMENTS.iter().find(|d| d.code == padded)
}
