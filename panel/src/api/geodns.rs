use super::Resource;
use crate::constants::query_keys;
use crate::schemas::{GeoDnsRecord, GeoDnsSchema};

pub struct GeoDns;

impl Resource for GeoDns {
    type Record = GeoDnsRecord;
    type Schema = GeoDnsSchema;

    const KEY: &'static str = query_keys::GEODNS;
    const BASE_PATH: &'static str = "/admin/geodns";
    const SINGULAR: &'static str = "DNS record";
    const PLURAL: &'static str = "DNS records";
}
