use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vacation_periods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub starts_at: DateTimeWithTimeZone,
    pub ends_at: DateTimeWithTimeZone,
    pub message: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vacation_subscribers::Entity")]
    VacationSubscribers,
}

impl Related<super::vacation_subscribers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VacationSubscribers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
