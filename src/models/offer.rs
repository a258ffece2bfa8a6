use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Offer entity as stored in the `offers` table.
///
/// Every field is optional in the JSON form: `id` is `None` until the row is
/// persisted, and `title`/`description` serialize as `null` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Offer {
    pub fn new(id: i32, title: impl Into<String>, description: Option<String>) -> Self {
        Offer {
            id: Some(id),
            title: Some(title.into()),
            description,
        }
    }

    /// Map a row selected as `id, title, description`.
    pub fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Offer {
            id: row.try_get(0)?,
            title: row.try_get(1)?,
            description: row.try_get(2)?,
        })
    }
}
