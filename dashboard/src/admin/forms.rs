//! Validation for console submissions. Each `validate_*` returns clean values
//! or the full set of field errors.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::dto::{
    CreateCollegeRequest, CreateNotificationRequest, CreateProfessorRequest, CreateResultRequest,
    CreateStudentRequest, CreateSubjectRequest, CreateUserRequest, UpdateCollegeRequest,
    UpdateUserRequest,
};
use crate::auth::NewAccount;
use crate::entity::{subject::DEFAULT_CREDITS, user::UserType};
use crate::web::forms::{FormErrors, REQUIRED, field_errors, optional_text, required_text};

pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";

// ---------- users ----------

pub fn validate_new_user(req: &CreateUserRequest) -> Result<NewAccount, FormErrors> {
    let mut errors = field_errors(req);

    let username = required_text(&mut errors, "username", req.username.as_deref());
    let password1 = req.password1.as_deref().filter(|p| !p.is_empty());
    let password2 = req.password2.as_deref().filter(|p| !p.is_empty());
    if password1.is_none() {
        errors.add("password1", REQUIRED);
    }
    if password2.is_none() {
        errors.add("password2", REQUIRED);
    }
    if let (Some(p1), Some(p2)) = (password1, password2)
        && p1 != p2
    {
        errors.add("password2", PASSWORD_MISMATCH);
    }

    errors.finish()?;

    Ok(NewAccount {
        username: username.unwrap_or_default(),
        password: password1.unwrap_or_default().to_string(),
        email: optional_text(req.email.as_deref()).unwrap_or_default(),
        first_name: optional_text(req.first_name.as_deref()).unwrap_or_default(),
        last_name: optional_text(req.last_name.as_deref()).unwrap_or_default(),
        user_type: req.user_type.unwrap_or_default(),
        college_id: req.college_id,
    })
}

/// Accounts created from the command line: one password, same rules as the
/// console creation form.
pub fn validate_cli_user(
    username: &str,
    password: &str,
    user_type: UserType,
    email: &str,
    college_id: Option<Uuid>,
) -> Result<NewAccount, FormErrors> {
    validate_new_user(&CreateUserRequest {
        username: Some(username.to_string()),
        email: optional_text(Some(email)),
        user_type: Some(user_type),
        college_id,
        password1: Some(password.to_string()),
        password2: Some(password.to_string()),
        ..Default::default()
    })
}

/// Checked change-form values. `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub fn validate_user_changes(req: &UpdateUserRequest) -> Result<UserChanges, FormErrors> {
    let mut errors = field_errors(req);
    let changes = UserChanges {
        username: req
            .username
            .as_deref()
            .and_then(|v| required_text(&mut errors, "username", Some(v))),
        email: req
            .email
            .as_ref()
            .map(|v| optional_text(v.as_deref()).unwrap_or_default()),
        first_name: req
            .first_name
            .as_deref()
            .map(|v| optional_text(Some(v)).unwrap_or_default()),
        last_name: req
            .last_name
            .as_deref()
            .map(|v| optional_text(Some(v)).unwrap_or_default()),
    };
    errors.finish()?;
    Ok(changes)
}

// ---------- colleges ----------

#[derive(Debug)]
pub struct CollegeFields {
    pub name: String,
    pub province: String,
    pub address: Option<String>,
    pub contact_email: Option<String>,
    pub phone_number: Option<String>,
}

pub fn validate_new_college(req: &CreateCollegeRequest) -> Result<CollegeFields, FormErrors> {
    let mut errors = field_errors(req);
    let name = required_text(&mut errors, "name", req.name.as_deref());
    let province = required_text(&mut errors, "province", req.province.as_deref());

    match (name, province) {
        (Some(name), Some(province)) if errors.is_empty() => Ok(CollegeFields {
            name,
            province,
            address: optional_text(req.address.as_deref()),
            contact_email: optional_text(req.contact_email.as_deref()),
            phone_number: optional_text(req.phone_number.as_deref()),
        }),
        _ => Err(errors),
    }
}

/// Same rules as creation, applied to the fields that are present.
pub fn validate_college_changes(req: &UpdateCollegeRequest) -> Result<(), FormErrors> {
    let mut errors = field_errors(req);
    if let Some(ref name) = req.name {
        required_text(&mut errors, "name", Some(name));
    }
    if let Some(ref province) = req.province {
        required_text(&mut errors, "province", Some(province));
    }
    errors.finish()
}

// ---------- role profiles ----------

pub fn validate_professor(req: &CreateProfessorRequest) -> Result<String, FormErrors> {
    let mut errors = field_errors(req);
    let department = required_text(&mut errors, "department", req.department.as_deref());
    errors.finish()?;
    Ok(department.unwrap_or_default())
}

#[derive(Debug)]
pub struct StudentFields {
    pub student_id: String,
    pub major: String,
    pub enrollment_year: Option<i32>,
}

pub fn validate_student(req: &CreateStudentRequest) -> Result<StudentFields, FormErrors> {
    let mut errors = field_errors(req);
    let student_id = required_text(&mut errors, "student_id", req.student_id.as_deref());
    let major = required_text(&mut errors, "major", req.major.as_deref());
    errors.finish()?;
    Ok(StudentFields {
        student_id: student_id.unwrap_or_default(),
        major: major.unwrap_or_default(),
        enrollment_year: req.enrollment_year,
    })
}

// ---------- subjects ----------

#[derive(Debug)]
pub struct SubjectFields {
    pub name: String,
    pub code: String,
    pub credits: i32,
}

pub fn validate_subject(req: &CreateSubjectRequest) -> Result<SubjectFields, FormErrors> {
    let mut errors = field_errors(req);
    let name = required_text(&mut errors, "name", req.name.as_deref());
    let code = required_text(&mut errors, "code", req.code.as_deref());
    errors.finish()?;
    Ok(SubjectFields {
        name: name.unwrap_or_default(),
        code: code.unwrap_or_default(),
        credits: req.credits.unwrap_or(DEFAULT_CREDITS),
    })
}

// ---------- notifications ----------

pub fn validate_notification(
    req: &CreateNotificationRequest,
) -> Result<(String, String), FormErrors> {
    let mut errors = field_errors(req);
    let title = required_text(&mut errors, "title", req.title.as_deref());
    let message = required_text(&mut errors, "message", req.message.as_deref());
    errors.finish()?;
    Ok((title.unwrap_or_default(), message.unwrap_or_default()))
}

// ---------- records ----------

/// `DECIMAL(5, 2)`: at most three integer digits and two decimal places.
pub fn marks_fit(marks: Decimal) -> bool {
    marks.normalize().scale() <= 2 && marks.abs() < Decimal::new(1000, 0)
}

pub fn validate_result(req: &CreateResultRequest) -> Result<(Decimal, String), FormErrors> {
    let mut errors = field_errors(req);
    if !marks_fit(req.marks) {
        errors.add(
            "marks",
            "Ensure that there are no more than 5 digits in total and no more than 2 decimal places.",
        );
    }
    let grade = required_text(&mut errors, "grade", req.grade.as_deref());
    errors.finish()?;
    let mut marks = req.marks;
    marks.rescale(2);
    Ok((marks, grade.unwrap_or_default()))
}
