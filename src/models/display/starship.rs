//! Starship display model

use tabled::Tabled;

use super::common::{or_dash, truncate_string};
use crate::swapi::Starship;

#[derive(Debug, Clone, Tabled)]
pub struct StarshipDisplay {
    #[tabled(rename = "ID")]
    pub id: String,

    #[tabled(rename = "NAME")]
    pub name: String,

    #[tabled(rename = "MODEL")]
    pub model: String,

    #[tabled(rename = "CLASS")]
    pub vehicle_class: String,

    #[tabled(rename = "MANUFACTURER")]
    pub manufacturer: String,
}

impl From<&Starship> for StarshipDisplay {
    fn from(ship: &Starship) -> Self {
        Self {
            id: ship.id.clone(),
            name: ship.name.clone(),
            model: truncate_string(&or_dash(&ship.model), 30),
            vehicle_class: or_dash(&ship.vehicle_class),
            manufacturer: truncate_string(&or_dash(&ship.manufacturer), 30),
        }
    }
}
