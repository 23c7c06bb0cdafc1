mod notice_service;

pub use notice_service::NoticeService;
