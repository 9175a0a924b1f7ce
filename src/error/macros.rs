//! # 错误处理宏

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::CertDbError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::CertDbError::config(format!($fmt, $($arg)*))
    };
}

/// 快速创建后端不可用错误的宏
#[macro_export]
macro_rules! backend_error {
    ($msg:expr) => {
        $crate::error::CertDbError::backend($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::CertDbError::backend(format!($fmt, $($arg)*))
    };
}

/// 确保条件成立，否则返回配置错误
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::config_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::config_error!($fmt, $($arg)*));
        }
    };
}

/// 确保条件成立，否则返回记录无效错误
#[macro_export]
macro_rules! ensure_record {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::error::CertDbError::invalid_record($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::error::CertDbError::invalid_record(format!($fmt, $($arg)*)));
        }
    };
}
