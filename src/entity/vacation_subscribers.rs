use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vacation_subscribers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub period_id: Uuid,
    pub email: String,
    pub notified: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vacation_periods::Entity",
        from = "Column::PeriodId",
        to = "super::vacation_periods::Column::Id"
    )]
    VacationPeriods,
}

impl Related<super::vacation_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VacationPeriods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
