use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::web::routes;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    /// `None` is legal for every role; super admins normally have none.
    pub college_id: Option<Uuid>,
    pub is_active: bool,
    pub last_login: Option<DateTime>,
    pub date_joined: DateTime,
}

/// Account role. Decides which dashboard a user lands on and which guards
/// let them through.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UserType {
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
    #[sea_orm(string_value = "college_admin")]
    CollegeAdmin,
    #[sea_orm(string_value = "professor")]
    Professor,
    #[default]
    #[sea_orm(string_value = "student")]
    Student,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::SuperAdmin => "super_admin",
            UserType::CollegeAdmin => "college_admin",
            UserType::Professor => "professor",
            UserType::Student => "student",
        }
    }

    /// Human label, as shown in choice lists.
    pub fn label(self) -> &'static str {
        match self {
            UserType::SuperAdmin => "Super Admin",
            UserType::CollegeAdmin => "College Admin",
            UserType::Professor => "Professor",
            UserType::Student => "Student",
        }
    }

    /// Where a signed-in user of this role is sent. Used both after login
    /// and when an already signed-in user revisits the login page.
    pub fn dashboard_route(self) -> &'static str {
        match self {
            UserType::SuperAdmin => routes::ADMIN_INDEX,
            UserType::CollegeAdmin => routes::COLLEGE_ADMIN_DASHBOARD,
            UserType::Professor => routes::PROFESSOR_DASHBOARD,
            UserType::Student => routes::STUDENT_DASHBOARD,
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "super_admin" => Ok(UserType::SuperAdmin),
            "college_admin" => Ok(UserType::CollegeAdmin),
            "professor" => Ok(UserType::Professor),
            "student" => Ok(UserType::Student),
            other => Err(format!(
                "unknown user type '{other}' (expected super_admin, college_admin, professor or student)"
            )),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::college::Entity",
        from = "Column::CollegeId",
        to = "super::college::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    College,
    #[sea_orm(has_one = "super::professor::Entity")]
    Professor,
    #[sea_orm(has_one = "super::student::Entity")]
    Student,
}

impl Related<super::college::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::College.def()
    }
}

impl Related<super::professor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Professor.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// "first last", or the username when no name is set.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn every_role_maps_to_a_distinct_route() {
        let routes: Vec<_> = UserType::iter().map(UserType::dashboard_route).collect();
        assert_eq!(routes.len(), 4);
        for (i, a) in routes.iter().enumerate() {
            for b in &routes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn dashboard_routes() {
        assert_eq!(UserType::SuperAdmin.dashboard_route(), "/admin/");
        assert_eq!(
            UserType::CollegeAdmin.dashboard_route(),
            "/college_admin/dashboard/"
        );
        assert_eq!(UserType::Professor.dashboard_route(), "/professor/dashboard/");
        assert_eq!(UserType::Student.dashboard_route(), "/student/dashboard/");
    }

    #[test]
    fn parses_its_own_string_form() {
        for role in UserType::iter() {
            assert_eq!(role.as_str().parse::<UserType>().unwrap(), role);
        }
        assert!("lecturer".parse::<UserType>().is_err());
    }

    #[test]
    fn default_role_is_student() {
        assert_eq!(UserType::default(), UserType::Student);
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let now = chrono::Utc::now().naive_utc();
        let mut user = Model {
            id: Uuid::now_v7(),
            username: "jdoe".into(),
            password_hash: String::new(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            user_type: UserType::Student,
            college_id: None,
            is_active: true,
            last_login: None,
            date_joined: now,
        };
        assert_eq!(user.display_name(), "jdoe");
        user.first_name = "Jane".into();
        assert_eq!(user.display_name(), "Jane");
        user.last_name = "Doe".into();
        assert_eq!(user.display_name(), "Jane Doe");
    }
}
