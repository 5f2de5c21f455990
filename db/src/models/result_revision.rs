use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};

/// Append-only trail of mark corrections on a result.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "result_revisions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub result_id: i64,
    pub old_marks: f64,
    pub new_marks: f64,
    pub reason: String,
    pub edited_by: i64,
    pub edited_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::result::Entity",
        from = "Column::ResultId",
        to = "super::result::Column::Id"
    )]
    Result,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::EditedBy",
        to = "super::user::Column::Id"
    )]
    Editor,
}

impl Related<super::result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Result.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Full history for one result, oldest first.
    pub async fn for_result(db: &DbConn, result_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ResultId.eq(result_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
