use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// A student's mark for one subject. At most one row per
/// (student, subject, college); the store enforces it with a unique index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "result")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub college_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub marks: Decimal,
    pub grade: String,
    pub date_recorded: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::UserId",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Subject,
    #[sea_orm(
        belongs_to = "super::college::Entity",
        from = "Column::CollegeId",
        to = "super::college::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    College,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl Related<super::college::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::College.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn display(
        &self,
        student: &super::user::Model,
        subject: &super::subject::Model,
        college: &super::college::Model,
    ) -> String {
        format!(
            "{} - {} ({}): {}",
            student.username, subject.name, college.name, self.grade
        )
    }
}
