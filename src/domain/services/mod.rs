//! # Domain Services
//!
//! エンティティに属さない純粋なビジネスルール
//!
//! - **KeyMapper**: ワークスペース名 → 移行先キー

pub mod key_mapper;
