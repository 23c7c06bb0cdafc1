pub mod notice_dto;

pub use notice_dto::{
    NoticeCreateDto, NoticeDetailResponseDto, NoticeResponseDto, NoticeSearchQuery, NoticeUpdateDto,
};
