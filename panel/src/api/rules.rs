use super::Resource;
use crate::constants::query_keys;
use crate::schemas::{Rule, RuleSchema};

pub struct Rules;

impl Resource for Rules {
    type Record = Rule;
    type Schema = RuleSchema;

    const KEY: &'static str = query_keys::RULES;
    const BASE_PATH: &'static str = "/admin/rules";
    const SINGULAR: &'static str = "Rule";
    const PLURAL: &'static str = "rules";
}
