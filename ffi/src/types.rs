//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Optional numbers travel as a
//! `has_*` flag next to the value. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use poptato_core::error::ApiError;
use poptato_core::http::{HttpMethod, HttpRequest};
use poptato_core::types::{TodayItem, YesterdayItem};

/// Opaque handle to a `PoptatoClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiPoptatoClient {
    pub(crate) inner: poptato_core::PoptatoClient,
}

/// Hand a Rust string to C. Interior NULs cannot be represented, so such a
/// string becomes empty.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Move `items` to the heap as a C array. Empty input yields null.
fn into_c_array<T>(items: Vec<T>) -> *mut T {
    if items.is_empty() {
        return std::ptr::null_mut();
    }
    Box::into_raw(items.into_boxed_slice()) as *mut T
}

/// Take back an array produced by `into_c_array`.
///
/// # Safety
/// `ptr` and `len` must come from one `into_c_array` call.
pub(crate) unsafe fn from_c_array<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    Box::from_raw(slice).into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `poptato_build_*` functions. The C caller executes the request
/// and passes the response back through `poptato_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(key, value)| FfiHeader {
                key: into_c_string(key),
                value: into_c_string(value),
            })
            .collect();
        let headers_len = headers.len() as u32;

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: into_c_string(req.path),
            headers: into_c_array(headers),
            headers_len,
            body: req.body.map_or(std::ptr::null_mut(), into_c_string),
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `poptato_parse_*` function. The FFI layer reads
/// but does not free these fields. A null `body` reads as empty.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiPoptatoResult`.
#[repr(C)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Http = 2,
    Deserialization = 3,
    Serialization = 4,
    Transport = 5,
    Panic = 6,
    NullArg = 7,
}

/// Tag that tells `poptato_free_result` what `FfiPoptatoResult::data` points to.
#[repr(C)]
pub enum FfiDataTag {
    None = 0,
    TodayList = 1,
    YesterdayList = 2,
}

/// A today todo exposed to C. `dday` is meaningful only when `has_dday`
/// is set; `deadline` is a `yyyy-MM-dd` string or null.
#[repr(C)]
pub struct FfiTodayItem {
    pub id: i64,
    pub content: *mut c_char,
    pub completed: bool,
    pub is_bookmark: bool,
    pub has_dday: bool,
    pub dday: i64,
    pub deadline: *mut c_char,
    pub is_repeat: bool,
}

impl From<TodayItem> for FfiTodayItem {
    fn from(item: TodayItem) -> Self {
        FfiTodayItem {
            id: item.id,
            completed: item.is_completed(),
            content: into_c_string(item.content),
            is_bookmark: item.is_bookmark,
            has_dday: item.dday.is_some(),
            dday: item.dday.unwrap_or_default(),
            deadline: item
                .deadline
                .map_or(std::ptr::null_mut(), |d| into_c_string(d.format("%Y-%m-%d").to_string())),
            is_repeat: item.is_repeat,
        }
    }
}

#[repr(C)]
pub struct FfiTodayList {
    pub items: *mut FfiTodayItem,
    pub len: u32,
    pub total_page_count: u32,
}

#[repr(C)]
pub struct FfiYesterdayItem {
    pub id: i64,
    pub content: *mut c_char,
}

impl From<YesterdayItem> for FfiYesterdayItem {
    fn from(item: YesterdayItem) -> Self {
        FfiYesterdayItem {
            id: item.id,
            content: into_c_string(item.content),
        }
    }
}

#[repr(C)]
pub struct FfiYesterdayList {
    pub items: *mut FfiYesterdayItem,
    pub len: u32,
    pub total_page_count: u32,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiPoptatoResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiPoptatoResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiPoptatoResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiPoptatoResult {
            error_code,
            error_message: into_c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Build a success result carrying a `FfiTodayList`.
    pub(crate) fn ok_today_list(todays: Vec<TodayItem>, total_page_count: u32) -> *mut Self {
        let items: Vec<FfiTodayItem> = todays.into_iter().map(FfiTodayItem::from).collect();
        let list = Box::new(FfiTodayList {
            len: items.len() as u32,
            items: into_c_array(items),
            total_page_count,
        });
        Self::ok(FfiDataTag::TodayList, Box::into_raw(list) as *mut c_void)
    }

    /// Build a success result carrying a `FfiYesterdayList`.
    pub(crate) fn ok_yesterday_list(yesterdays: Vec<YesterdayItem>, total_page_count: u32) -> *mut Self {
        let items: Vec<FfiYesterdayItem> = yesterdays.into_iter().map(FfiYesterdayItem::from).collect();
        let list = Box::new(FfiYesterdayList {
            len: items.len() as u32,
            items: into_c_array(items),
            total_page_count,
        });
        Self::ok(FfiDataTag::YesterdayList, Box::into_raw(list) as *mut c_void)
    }

    /// Build a success result with no data payload (every mutation).
    pub(crate) fn ok_empty() -> *mut Self {
        Self::ok(FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::NotFound => (FfiErrorCode::NotFound, 404u16),
            ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
            ApiError::TransportError(_) => (FfiErrorCode::Transport, 0),
        };
        Self::failure(error_code, http_status, err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, 0, msg.to_string())
    }
}
