use sea_orm::sea_query::Expr;

use crate::{entity::car, prelude::*};

pub struct Car<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Car<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_agency(&self, agency_id: i64) -> Result<Vec<car::Model>> {
    Ok(
      car::Entity::find()
        .filter(car::Column::SupplierId.eq(agency_id))
        .order_by_asc(car::Column::Id)
        .all(self.db)
        .await?,
    )
  }

  /// Ids of the agency's cars that are currently on sale, ascending.
  pub async fn available_ids<C: ConnectionTrait>(
    conn: &C,
    agency_id: i64,
  ) -> Result<Vec<i64>> {
    let cars = car::Entity::find()
      .filter(car::Column::SupplierId.eq(agency_id))
      .filter(car::Column::Available.eq(true))
      .order_by_asc(car::Column::Id)
      .all(conn)
      .await?;
    Ok(cars.into_iter().map(|car| car.id).collect())
  }

  /// Sets `available` on the given cars of one agency. Ids owned by another
  /// agency are left untouched.
  pub async fn set_available<C: ConnectionTrait>(
    conn: &C,
    agency_id: i64,
    ids: &[i64],
    available: bool,
  ) -> Result<u64> {
    if ids.is_empty() {
      return Ok(0);
    }

    let result = car::Entity::update_many()
      .col_expr(car::Column::Available, Expr::value(available))
      .filter(car::Column::SupplierId.eq(agency_id))
      .filter(car::Column::Id.is_in(ids.to_vec()))
      .exec(conn)
      .await?;

    Ok(result.rows_affected)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::{fixtures, test_db};

  #[tokio::test]
  async fn test_set_available_scoped_to_agency() {
    let db = test_db::setup().await;
    fixtures::agency(&db, 10, "Agence Sud").await;
    fixtures::agency(&db, 20, "Agence Nord").await;
    fixtures::car(&db, 1, 10, true).await;
    fixtures::car(&db, 2, 10, true).await;
    fixtures::car(&db, 3, 20, true).await;

    let changed = Car::set_available(&db, 10, &[1, 2, 3], false).await.unwrap();
    assert_eq!(changed, 2);

    assert!(Car::available_ids(&db, 10).await.unwrap().is_empty());
    assert_eq!(Car::available_ids(&db, 20).await.unwrap(), vec![3]);
  }
}
