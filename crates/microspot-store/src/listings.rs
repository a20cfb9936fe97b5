//! CRUD and search operations for [`Listing`] records and their images.
//!
//! Images live and die with their listing: they are created alongside it
//! and replaced wholesale on edit, inside one transaction so no reader ever
//! observes a listing with zero images mid-update.

use chrono::Utc;
use rusqlite::{params, Transaction};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{
    AccessHours, Image, ImageInput, Listing, ListingStatus, ListingWithDetails, MainCategory,
    OwnerSummary, SpaceType, SubCategory,
};
use crate::query::ListingFilter;
use crate::users::{parse_timestamp, parse_uuid};

/// The canonical listing column list, aliased `l`, in [`row_to_listing`]
/// order.
pub(crate) const LISTING_COLUMNS: &str = "l.id, l.title, l.description, l.surface, l.price, \
     l.address, l.postal_code, l.city, l.main_category, l.sub_category, l.specific_type, \
     l.space_type, l.has_concrete_slab, l.has_electricity, l.has_water, l.internet_type, \
     l.is_24_7, l.opening_time, l.closing_time, l.status, l.owner_id, l.created_at, l.updated_at";

/// The editable fields of a listing.  The category triple is fixed at
/// creation; an edit replaces everything else, images included.
#[derive(Debug, Clone)]
pub struct ListingUpdate {
    pub title: String,
    pub description: String,
    pub surface: f64,
    pub price: f64,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub space_type: SpaceType,
    pub has_concrete_slab: bool,
    pub has_electricity: bool,
    pub has_water: bool,
    pub internet_type: Option<String>,
    pub access: AccessHours,
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new listing together with its images, atomically.
    pub fn create_listing(&mut self, listing: &Listing, images: &[ImageInput]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let (is_24_7, opening_time, closing_time) = access_columns(&listing.access);
        tx.execute(
            "INSERT INTO listings (id, title, description, surface, price, address,
                                   postal_code, city, main_category, sub_category,
                                   specific_type, space_type, has_concrete_slab,
                                   has_electricity, has_water, internet_type, is_24_7,
                                   opening_time, closing_time, status, owner_id,
                                   created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
            params![
                listing.id.to_string(),
                listing.title,
                listing.description,
                listing.surface,
                listing.price,
                listing.address,
                listing.postal_code,
                listing.city,
                listing.main_category.as_str(),
                listing.sub_category.map(|s| s.as_str()),
                listing.specific_type,
                listing.space_type.as_str(),
                listing.has_concrete_slab,
                listing.has_electricity,
                listing.has_water,
                listing.internet_type,
                is_24_7,
                opening_time,
                closing_time,
                listing.status.as_str(),
                listing.owner_id.to_string(),
                listing.created_at.to_rfc3339(),
                listing.updated_at.to_rfc3339(),
            ],
        )?;

        insert_images(&tx, listing.id, images)?;

        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single listing with its owner's public fields and images.
    pub fn get_listing(&self, id: Uuid) -> Result<ListingWithDetails> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS}, u.id, u.name, u.email
             FROM listings l JOIN users u ON u.id = l.owner_id
             WHERE l.id = ?1"
        );

        let mut detailed = self
            .conn()
            .query_row(&sql, params![id.to_string()], row_to_detailed)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        detailed.images = self.images_for_listing(id)?;
        Ok(detailed)
    }

    /// Search active listings with the given filter, newest first.
    pub fn search_listings(&self, filter: &ListingFilter) -> Result<Vec<ListingWithDetails>> {
        let (where_clause, values) = filter.build_where();
        let sql = format!(
            "SELECT {LISTING_COLUMNS}, u.id, u.name, u.email
             FROM listings l JOIN users u ON u.id = l.owner_id
             WHERE {where_clause}
             ORDER BY l.created_at DESC"
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values), row_to_detailed)?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        for detailed in &mut listings {
            detailed.images = self.images_for_listing(detailed.listing.id)?;
        }
        Ok(listings)
    }

    /// List every listing owned by a user regardless of status, newest
    /// first.
    pub fn listings_for_owner(&self, owner_id: Uuid) -> Result<Vec<ListingWithDetails>> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS}, u.id, u.name, u.email
             FROM listings l JOIN users u ON u.id = l.owner_id
             WHERE l.owner_id = ?1
             ORDER BY l.created_at DESC"
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![owner_id.to_string()], row_to_detailed)?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        for detailed in &mut listings {
            detailed.images = self.images_for_listing(detailed.listing.id)?;
        }
        Ok(listings)
    }

    /// The images of a listing, in display order.
    pub fn images_for_listing(&self, listing_id: Uuid) -> Result<Vec<Image>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, url, public_id, listing_id, position
             FROM images WHERE listing_id = ?1
             ORDER BY position ASC",
        )?;

        let rows = stmt.query_map(params![listing_id.to_string()], row_to_image)?;

        let mut images = Vec::new();
        for row in rows {
            images.push(row?);
        }
        Ok(images)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply an edit and replace the image set, in one transaction.
    ///
    /// Ownership is checked by the caller; this only fails with
    /// [`StoreError::NotFound`] when the listing does not exist.
    pub fn update_listing(
        &mut self,
        id: Uuid,
        update: &ListingUpdate,
        images: &[ImageInput],
    ) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let (is_24_7, opening_time, closing_time) = access_columns(&update.access);
        let affected = tx.execute(
            "UPDATE listings SET
                 title = ?2, description = ?3, surface = ?4, price = ?5, address = ?6,
                 postal_code = ?7, city = ?8, space_type = ?9, has_concrete_slab = ?10,
                 has_electricity = ?11, has_water = ?12, internet_type = ?13,
                 is_24_7 = ?14, opening_time = ?15, closing_time = ?16, updated_at = ?17
             WHERE id = ?1",
            params![
                id.to_string(),
                update.title,
                update.description,
                update.surface,
                update.price,
                update.address,
                update.postal_code,
                update.city,
                update.space_type.as_str(),
                update.has_concrete_slab,
                update.has_electricity,
                update.has_water,
                update.internet_type,
                is_24_7,
                opening_time,
                closing_time,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        // Replace the whole image set; diffing is deliberately not
        // attempted, image ids are not stable across edits.
        tx.execute(
            "DELETE FROM images WHERE listing_id = ?1",
            params![id.to_string()],
        )?;
        insert_images(&tx, id, images)?;

        tx.commit()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn insert_images(tx: &Transaction<'_>, listing_id: Uuid, images: &[ImageInput]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO images (id, url, public_id, listing_id, position)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (position, image) in images.iter().enumerate() {
        stmt.execute(params![
            Uuid::new_v4().to_string(),
            image.url,
            image.public_id,
            listing_id.to_string(),
            position as i64,
        ])?;
    }
    Ok(())
}

fn access_columns(access: &AccessHours) -> (bool, Option<&str>, Option<&str>) {
    match access {
        AccessHours::RoundTheClock => (true, None, None),
        AccessHours::Scheduled {
            opening_time,
            closing_time,
        } => (false, Some(opening_time), Some(closing_time)),
    }
}

fn bad_column(column: usize, detail: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, detail.into())
}

/// Map a row selected with [`LISTING_COLUMNS`] to a [`Listing`].
pub(crate) fn row_to_listing(row: &rusqlite::Row<'_>) -> rusqlite::Result<Listing> {
    let id_str: String = row.get(0)?;
    let main_str: String = row.get(8)?;
    let sub_str: Option<String> = row.get(9)?;
    let space_str: String = row.get(11)?;
    let is_24_7: bool = row.get(16)?;
    let opening_time: Option<String> = row.get(17)?;
    let closing_time: Option<String> = row.get(18)?;
    let status_str: String = row.get(19)?;
    let owner_str: String = row.get(20)?;
    let created_str: String = row.get(21)?;
    let updated_str: String = row.get(22)?;

    let main_category = MainCategory::parse(&main_str)
        .ok_or_else(|| bad_column(8, format!("unknown main category '{main_str}'")))?;
    let sub_category = match sub_str {
        Some(s) => Some(
            SubCategory::parse(&s)
                .ok_or_else(|| bad_column(9, format!("unknown sub-category '{s}'")))?,
        ),
        None => None,
    };
    let space_type = SpaceType::parse(&space_str)
        .ok_or_else(|| bad_column(11, format!("unknown space type '{space_str}'")))?;
    let status = ListingStatus::parse(&status_str)
        .ok_or_else(|| bad_column(19, format!("unknown status '{status_str}'")))?;

    let access = if is_24_7 {
        AccessHours::RoundTheClock
    } else {
        match (opening_time, closing_time) {
            (Some(opening_time), Some(closing_time)) => AccessHours::Scheduled {
                opening_time,
                closing_time,
            },
            _ => {
                return Err(bad_column(
                    17,
                    "scheduled listing without opening/closing times".into(),
                ))
            }
        }
    };

    Ok(Listing {
        id: parse_uuid(&id_str, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        surface: row.get(3)?,
        price: row.get(4)?,
        address: row.get(5)?,
        postal_code: row.get(6)?,
        city: row.get(7)?,
        main_category,
        sub_category,
        specific_type: row.get(10)?,
        space_type,
        has_concrete_slab: row.get(12)?,
        has_electricity: row.get(13)?,
        has_water: row.get(14)?,
        internet_type: row.get(15)?,
        access,
        status,
        owner_id: parse_uuid(&owner_str, 20)?,
        created_at: parse_timestamp(&created_str, 21)?,
        updated_at: parse_timestamp(&updated_str, 22)?,
    })
}

/// Map a row of [`LISTING_COLUMNS`] plus owner id/name/email.  Images are
/// filled in by the caller.
fn row_to_detailed(row: &rusqlite::Row<'_>) -> rusqlite::Result<ListingWithDetails> {
    let listing = row_to_listing(row)?;
    let owner_id_str: String = row.get(23)?;

    Ok(ListingWithDetails {
        listing,
        owner: OwnerSummary {
            id: parse_uuid(&owner_id_str, 23)?,
            name: row.get(24)?,
            email: row.get(25)?,
        },
        images: Vec::new(),
    })
}

fn row_to_image(row: &rusqlite::Row<'_>) -> rusqlite::Result<Image> {
    let id_str: String = row.get(0)?;
    let listing_str: String = row.get(3)?;

    Ok(Image {
        id: parse_uuid(&id_str, 0)?,
        url: row.get(1)?,
        public_id: row.get(2)?,
        listing_id: parse_uuid(&listing_str, 3)?,
        position: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::AccessFilter;
    use crate::test_support::{listing_record, new_user, test_db};

    fn image(url: &str) -> ImageInput {
        ImageInput {
            url: url.to_string(),
            public_id: format!("pub-{url}"),
        }
    }

    #[test]
    fn create_and_fetch_with_details() {
        let mut db = test_db();
        let owner = new_user(&db, "Alice", "alice@example.fr");
        let listing = listing_record(owner.id, "Spot near the bakery");

        db.create_listing(&listing, &[image("/uploads/a.jpg"), image("/uploads/b.jpg")])
            .unwrap();

        let detailed = db.get_listing(listing.id).unwrap();
        assert_eq!(detailed.listing.title, "Spot near the bakery");
        assert_eq!(detailed.owner.name, "Alice");
        assert_eq!(detailed.owner.email, "alice@example.fr");
        assert_eq!(detailed.images.len(), 2);
        assert_eq!(detailed.images[0].url, "/uploads/a.jpg");
        assert_eq!(detailed.images[0].position, 0);
        assert_eq!(detailed.images[1].position, 1);
    }

    #[test]
    fn missing_listing_is_not_found() {
        let db = test_db();
        assert!(matches!(
            db.get_listing(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn empty_filter_returns_active_newest_first() {
        let mut db = test_db();
        let owner = new_user(&db, "Alice", "alice@example.fr");

        let mut older = listing_record(owner.id, "Older spot");
        older.created_at = older.created_at - chrono::Duration::hours(2);
        db.create_listing(&older, &[]).unwrap();

        let newer = listing_record(owner.id, "Newer spot");
        db.create_listing(&newer, &[]).unwrap();

        let mut inactive = listing_record(owner.id, "Hidden spot");
        inactive.status = ListingStatus::Inactive;
        db.create_listing(&inactive, &[]).unwrap();

        let results = db.search_listings(&ListingFilter::default()).unwrap();
        let titles: Vec<_> = results.iter().map(|l| l.listing.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer spot", "Older spot"]);
    }

    #[test]
    fn price_range_is_inclusive() {
        let mut db = test_db();
        let owner = new_user(&db, "Alice", "alice@example.fr");

        for (title, price) in [("Cheap", 50.0), ("Low edge", 100.0), ("High edge", 200.0), ("Dear", 300.0)] {
            let mut listing = listing_record(owner.id, title);
            listing.price = price;
            db.create_listing(&listing, &[]).unwrap();
        }

        let results = db
            .search_listings(&ListingFilter {
                min_price: Some(100.0),
                max_price: Some(200.0),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.listing.price >= 100.0 && result.listing.price <= 200.0);
        }
    }

    #[test]
    fn amenity_filter_narrows_only_when_requested() {
        let mut db = test_db();
        let owner = new_user(&db, "Alice", "alice@example.fr");

        let mut powered = listing_record(owner.id, "Powered");
        powered.has_electricity = true;
        db.create_listing(&powered, &[]).unwrap();
        db.create_listing(&listing_record(owner.id, "Unpowered"), &[])
            .unwrap();

        let all = db.search_listings(&ListingFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let filtered = db
            .search_listings(&ListingFilter {
                has_electricity: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].listing.has_electricity);
    }

    #[test]
    fn text_and_location_both_apply() {
        let mut db = test_db();
        let owner = new_user(&db, "Alice", "alice@example.fr");

        let mut lyon = listing_record(owner.id, "Pizza vending spot");
        lyon.city = "Lyon".into();
        db.create_listing(&lyon, &[]).unwrap();

        let mut paris = listing_record(owner.id, "Pizza corner");
        paris.city = "Paris".into();
        db.create_listing(&paris, &[]).unwrap();

        let results = db
            .search_listings(&ListingFilter {
                query: Some("pizza".into()),
                location: Some("lyon".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].listing.city, "Lyon");
    }

    #[test]
    fn access_round_trip_and_filter() {
        let mut db = test_db();
        let owner = new_user(&db, "Alice", "alice@example.fr");

        let mut always_open = listing_record(owner.id, "Always open");
        always_open.access = AccessHours::RoundTheClock;
        db.create_listing(&always_open, &[]).unwrap();

        let mut scheduled = listing_record(owner.id, "Business hours");
        scheduled.access = AccessHours::Scheduled {
            opening_time: "08:00".into(),
            closing_time: "20:00".into(),
        };
        db.create_listing(&scheduled, &[]).unwrap();

        // Round-trip preserves the invariant in both directions.
        let fetched = db.get_listing(always_open.id).unwrap();
        assert_eq!(fetched.listing.access, AccessHours::RoundTheClock);
        let fetched = db.get_listing(scheduled.id).unwrap();
        assert!(matches!(
            fetched.listing.access,
            AccessHours::Scheduled { .. }
        ));

        let round_the_clock = db
            .search_listings(&ListingFilter {
                access: Some(AccessFilter::RoundTheClock),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(round_the_clock.len(), 1);
        assert_eq!(round_the_clock[0].listing.title, "Always open");

        // A 09:00-18:00 window admits the 24/7 spot and the 08:00-20:00 one.
        let window = db
            .search_listings(&ListingFilter {
                open_before: Some("09:00".into()),
                open_after: Some("18:00".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn update_replaces_fields_and_images() {
        let mut db = test_db();
        let owner = new_user(&db, "Alice", "alice@example.fr");
        let listing = listing_record(owner.id, "Before");
        db.create_listing(&listing, &[image("/uploads/old.jpg")])
            .unwrap();

        let update = ListingUpdate {
            title: "After".into(),
            description: "Edited".into(),
            surface: 9.5,
            price: 180.0,
            address: "2 rue Neuve".into(),
            postal_code: "69002".into(),
            city: "Lyon".into(),
            space_type: SpaceType::Mixed,
            has_concrete_slab: true,
            has_electricity: true,
            has_water: false,
            internet_type: Some("FIBER".into()),
            access: AccessHours::RoundTheClock,
        };
        db.update_listing(
            listing.id,
            &update,
            &[image("/uploads/new1.jpg"), image("/uploads/new2.jpg")],
        )
        .unwrap();

        let detailed = db.get_listing(listing.id).unwrap();
        assert_eq!(detailed.listing.title, "After");
        assert_eq!(detailed.listing.access, AccessHours::RoundTheClock);
        assert_eq!(detailed.listing.internet_type.as_deref(), Some("FIBER"));
        let urls: Vec<_> = detailed.images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["/uploads/new1.jpg", "/uploads/new2.jpg"]);
        // Category triple is untouched by edits.
        assert_eq!(detailed.listing.main_category, listing.main_category);
    }

    #[test]
    fn update_of_missing_listing_is_not_found() {
        let mut db = test_db();
        let update = ListingUpdate {
            title: "X".into(),
            description: "X".into(),
            surface: 1.0,
            price: 1.0,
            address: "X".into(),
            postal_code: "75001".into(),
            city: "Paris".into(),
            space_type: SpaceType::Indoor,
            has_concrete_slab: false,
            has_electricity: false,
            has_water: false,
            internet_type: None,
            access: AccessHours::RoundTheClock,
        };
        assert!(matches!(
            db.update_listing(Uuid::new_v4(), &update, &[]),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn owner_listing_list_includes_inactive() {
        let mut db = test_db();
        let owner = new_user(&db, "Alice", "alice@example.fr");
        let other = new_user(&db, "Bob", "bob@example.fr");

        db.create_listing(&listing_record(owner.id, "Mine"), &[])
            .unwrap();
        let mut rented = listing_record(owner.id, "Mine, rented");
        rented.status = ListingStatus::Rented;
        db.create_listing(&rented, &[]).unwrap();
        db.create_listing(&listing_record(other.id, "Not mine"), &[])
            .unwrap();

        let mine = db.listings_for_owner(owner.id).unwrap();
        assert_eq!(mine.len(), 2);
    }
}
