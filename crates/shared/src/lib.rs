//! 共享库
//!
//! 包含通知分发服务共用的配置、错误处理、渠道与事件枚举以及可观测性基础设施代码。

pub mod config;
pub mod error;
pub mod events;
pub mod observability;
