//! College management dashboard: accounts, role-based dashboards and a
//! super-admin console over colleges, profiles, subjects, results,
//! attendance and notifications.

pub mod admin;
pub mod auth;
pub mod config;
pub mod entity;
pub mod web;
