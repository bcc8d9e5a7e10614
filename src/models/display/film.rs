//! Film display model

use tabled::Tabled;

use super::common::{or_dash, truncate_string};
use crate::swapi::Film;

#[derive(Debug, Clone, Tabled)]
pub struct FilmDisplay {
    #[tabled(rename = "ID")]
    pub id: String,

    #[tabled(rename = "TITLE")]
    pub title: String,

    #[tabled(rename = "DIRECTOR")]
    pub director: String,

    #[tabled(rename = "PRODUCER")]
    pub producer: String,

    #[tabled(rename = "RELEASED")]
    pub release_date: String,
}

impl From<&Film> for FilmDisplay {
    fn from(film: &Film) -> Self {
        Self {
            id: film.id.clone(),
            title: film.title.clone(),
            director: or_dash(&film.director),
            producer: truncate_string(&or_dash(&film.producer), 30),
            release_date: or_dash(&film.release_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_film_display_from_film() {
        let film = Film {
            id: "4".to_string(),
            title: "The Phantom Menace".to_string(),
            director: "George Lucas".to_string(),
            producer: "Rick McCallum".to_string(),
            release_date: "1999-05-19".to_string(),
            image: String::new(),
        };

        let display = FilmDisplay::from(&film);

        assert_eq!(display.title, "The Phantom Menace");
        assert_eq!(display.release_date, "1999-05-19");
    }
}
