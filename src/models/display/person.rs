//! Person display model

use tabled::Tabled;

use super::common::{join_names, or_dash};
use crate::swapi::Person;

const NAMES_WIDTH: usize = 40;

#[derive(Debug, Clone, Tabled)]
pub struct PersonDisplay {
    #[tabled(rename = "ID")]
    pub id: String,

    #[tabled(rename = "NAME")]
    pub name: String,

    /// Height in cm
    #[tabled(rename = "HEIGHT")]
    pub height: String,

    /// Mass in kg
    #[tabled(rename = "MASS")]
    pub mass: String,

    #[tabled(rename = "GENDER")]
    pub gender: String,

    /// Starship names, truncated
    #[tabled(rename = "STARSHIPS")]
    pub starships: String,

    /// Film titles, truncated
    #[tabled(rename = "FILMS")]
    pub films: String,
}

impl From<&Person> for PersonDisplay {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            name: person.name.clone(),
            height: or_dash(&person.height),
            mass: or_dash(&person.mass),
            gender: or_dash(&person.gender),
            starships: join_names(
                person.starships.iter().map(|s| s.name.as_str()),
                NAMES_WIDTH,
            ),
            films: join_names(person.films.iter().map(|f| f.title.as_str()), NAMES_WIDTH),
        }
    }
}
