use super::Resource;
use crate::constants::query_keys;
use crate::schemas::user::WRITE_ONLY_FIELDS;
use crate::schemas::{User, UserSchema};

/// User accounts live under the auth service, not `/admin`
pub struct Users;

impl Resource for Users {
    type Record = User;
    type Schema = UserSchema;

    const KEY: &'static str = query_keys::USERS;
    const BASE_PATH: &'static str = "/auth/users";
    const SINGULAR: &'static str = "User";
    const PLURAL: &'static str = "users";
    const WRITE_ONLY: &'static [&'static str] = WRITE_ONLY_FIELDS;
}
