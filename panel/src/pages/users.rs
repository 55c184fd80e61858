use super::ResourcePage;
use crate::api::Users;
use crate::app::PanelState;
use crate::table::columns::user_columns;

pub type UsersPage = ResourcePage<Users>;

pub fn users_page(state: &PanelState) -> UsersPage {
    ResourcePage::new(state.hooks::<Users>(), user_columns())
}
