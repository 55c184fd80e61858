use super::Resource;
use crate::constants::query_keys;
use crate::schemas::{Route, RouteSchema};

pub struct Routes;

impl Resource for Routes {
    type Record = Route;
    type Schema = RouteSchema;

    const KEY: &'static str = query_keys::ROUTES;
    const BASE_PATH: &'static str = "/admin/routes";
    const SINGULAR: &'static str = "Route";
    const PLURAL: &'static str = "routes";
}
