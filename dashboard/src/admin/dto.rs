use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entity::{
    attendance, college, notification, professor, result, student, subject,
    user::{self, UserType},
};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Optional text where `""` means "not given".
fn blank_as_none<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(d).map(non_blank)
}

/// Like [`double_option`], with `""` treated as an explicit `null`.
fn blank_as_null<'de, D>(d: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(d).map(|v| Some(non_blank(v)))
}

lazy_static::lazy_static! {
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[\w.@+-]*$").unwrap();
}

// ---------- shared ----------

/// Paging plus every list filter the console supports; each list endpoint
/// reads the ones that apply to it.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
    pub user_type: Option<UserType>,
    pub college_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub recipient_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Serialize)]
pub struct AdminIndex {
    pub site: &'static str,
    pub user: String,
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Serialize)]
pub struct ModelEntry {
    pub name: &'static str,
    pub url: String,
}

// ---------- colleges ----------

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateCollegeRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub province: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email(message = "Enter a valid email address."), length(max = 254))]
    pub contact_email: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCollegeRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub province: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "blank_as_null")]
    #[validate(email(message = "Enter a valid email address."), length(max = 254))]
    pub contact_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 20))]
    pub phone_number: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct CollegeResponse {
    pub id: Uuid,
    pub name: String,
    pub province: String,
    pub address: Option<String>,
    pub contact_email: Option<String>,
    pub phone_number: Option<String>,
    pub display: String,
}

impl From<college::Model> for CollegeResponse {
    fn from(m: college::Model) -> Self {
        Self {
            display: m.display(),
            id: m.id,
            name: m.name,
            province: m.province,
            address: m.address,
            contact_email: m.contact_email,
            phone_number: m.phone_number,
        }
    }
}

// ---------- users ----------

/// Account creation form: identity, role, college and a confirmed password.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(max = 150),
        regex(
            path = &*USERNAME_REGEX,
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email(message = "Enter a valid email address."), length(max = 254))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub user_type: Option<UserType>,
    pub college_id: Option<Uuid>,
    pub password1: Option<String>,
    pub password2: Option<String>,
}

/// Account change form. Absent fields are left alone; `college_id: null`
/// detaches the user from their college and `email: null` clears the address.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(max = 150),
        regex(
            path = &*USERNAME_REGEX,
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "blank_as_null")]
    #[validate(email(message = "Enter a valid email address."), length(max = 254))]
    pub email: Option<Option<String>>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub user_type: Option<UserType>,
    #[serde(default, deserialize_with = "double_option")]
    pub college_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub college_id: Option<Uuid>,
    pub is_active: bool,
    pub last_login: Option<NaiveDateTime>,
    pub date_joined: NaiveDateTime,
    pub display: String,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            display: m.display_name(),
            id: m.id,
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            user_type: m.user_type,
            college_id: m.college_id,
            is_active: m.is_active,
            last_login: m.last_login,
            date_joined: m.date_joined,
        }
    }
}

// ---------- role profiles ----------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfessorRequest {
    pub user_id: Uuid,
    #[validate(length(max = 100))]
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfessorResponse {
    pub user_id: Uuid,
    pub username: String,
    pub department: String,
    pub display: String,
}

impl ProfessorResponse {
    pub fn new(m: professor::Model, owner: &user::Model) -> Self {
        Self {
            user_id: m.user_id,
            username: owner.username.clone(),
            department: m.department,
            display: owner.display_name(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    pub user_id: Uuid,
    #[validate(length(max = 20))]
    pub student_id: Option<String>,
    #[validate(length(max = 100))]
    pub major: Option<String>,
    pub enrollment_year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub user_id: Uuid,
    pub username: String,
    pub student_id: String,
    pub major: String,
    pub enrollment_year: Option<i32>,
    pub display: String,
}

impl StudentResponse {
    pub fn new(m: student::Model, owner: &user::Model) -> Self {
        Self {
            user_id: m.user_id,
            username: owner.username.clone(),
            student_id: m.student_id,
            major: m.major,
            enrollment_year: m.enrollment_year,
            display: owner.display_name(),
        }
    }
}

// ---------- subjects ----------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 20))]
    pub code: Option<String>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub credits: Option<i32>,
    pub college_id: Uuid,
    pub professor_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SubjectResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub credits: i32,
    pub college_id: Uuid,
    pub professor_id: Option<Uuid>,
    pub display: String,
}

impl SubjectResponse {
    pub fn new(m: subject::Model, college: &college::Model) -> Self {
        Self {
            display: m.display(college),
            id: m.id,
            name: m.name,
            code: m.code,
            credits: m.credits,
            college_id: m.college_id,
            professor_id: m.professor_id,
        }
    }
}

// ---------- academic records ----------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateResultRequest {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub college_id: Uuid,
    pub marks: Decimal,
    #[validate(length(max = 5))]
    pub grade: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub college_id: Uuid,
    pub marks: Decimal,
    pub grade: String,
    pub date_recorded: NaiveDateTime,
    pub display: String,
}

impl ResultResponse {
    pub fn new(m: result::Model, display: String) -> Self {
        let mut marks = m.marks;
        // Some backends hand decimals back without trailing zeros.
        marks.rescale(2);
        Self {
            id: m.id,
            student_id: m.student_id,
            subject_id: m.subject_id,
            college_id: m.college_id,
            marks,
            grade: m.grade,
            date_recorded: m.date_recorded,
            display,
        }
    }
}

fn default_present() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateAttendanceRequest {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub college_id: Uuid,
    pub date: NaiveDate,
    #[serde(default = "default_present")]
    pub is_present: bool,
}

#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub college_id: Uuid,
    pub date: NaiveDate,
    pub is_present: bool,
    pub display: String,
}

impl AttendanceResponse {
    pub fn new(m: attendance::Model, display: String) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            subject_id: m.subject_id,
            college_id: m.college_id,
            date: m.date,
            is_present: m.is_present,
            display,
        }
    }
}

// ---------- notifications ----------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    pub recipient_id: Uuid,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    pub message: Option<String>,
    /// Omit for a platform-wide notification.
    pub college_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub college_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
    pub display: String,
}

impl NotificationResponse {
    pub fn new(m: notification::Model, display: String) -> Self {
        Self {
            id: m.id,
            recipient_id: m.recipient_id,
            sender_id: m.sender_id,
            college_id: m.college_id,
            title: m.title,
            message: m.message,
            is_read: m.is_read,
            created_at: m.created_at,
            display,
        }
    }
}
