use crate::{
  entity::{user, user::UserRole},
  prelude::*,
};

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_id(&self, id: i64) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(self.db).await?)
  }

  /// Loads a supplier account, failing with `AgencyNotFound` for unknown ids
  /// and for users that are not agencies.
  pub async fn agency(&self, id: i64) -> Result<user::Model> {
    Self::agency_on(self.db, id).await
  }

  pub async fn agency_on<C: ConnectionTrait>(
    conn: &C,
    id: i64,
  ) -> Result<user::Model> {
    user::Entity::find_by_id(id)
      .one(conn)
      .await?
      .filter(|user| user.role == UserRole::Supplier)
      .ok_or(Error::AgencyNotFound)
  }

  pub async fn by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, user::Model>> {
    if ids.is_empty() {
      return Ok(HashMap::new());
    }

    let users = user::Entity::find()
      .filter(user::Column::Id.is_in(ids.to_vec()))
      .all(self.db)
      .await?;
    Ok(users.into_iter().map(|user| (user.id, user)).collect())
  }

  pub async fn set_blacklisted<C: ConnectionTrait>(
    conn: &C,
    agency: user::Model,
    blacklisted: bool,
  ) -> Result<user::Model> {
    if agency.blacklisted == blacklisted {
      return Ok(agency);
    }

    Ok(
      user::ActiveModel { blacklisted: Set(blacklisted), ..agency.into() }
        .update(conn)
        .await?,
    )
  }
}
