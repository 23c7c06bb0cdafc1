pub mod notice_handler;

pub use notice_handler::{
    create_notice, delete_notice, get_notice, list_notices, search_notices, update_notice,
};
