//! C-ABI wrapper around `poptato-core`.
//!
//! # Overview
//! Exposes every Poptato endpoint through `extern "C"` functions so the
//! mobile hosts can build and parse HTTP requests/responses without linking
//! to Rust's async runtime or serde directly. The host owns the network.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - One `poptato_build_*` per endpoint; list endpoints have their own
//!   `poptato_parse_*`, every mutation shares `poptato_parse_ack`.
//! - A single `FfiPoptatoResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `poptato_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};

use chrono::NaiveDate;
use poptato_core::http::{HttpRequest, HttpResponse};
use poptato_core::types::{TodoId, TODAY_ORDER_TYPE};
use poptato_core::PoptatoClient;

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `PoptatoClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `poptato_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_client_new(base_url: *const c_char) -> *mut FfiPoptatoClient {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        let url = unsafe { CStr::from_ptr(base_url) }.to_str().unwrap_or("");
        let client = PoptatoClient::new(url);
        Box::into_raw(Box::new(FfiPoptatoClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `poptato_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_client_free(client: *mut FfiPoptatoClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Shared body of every builder: null and panic handling around `build`.
fn build_request<F>(client: *const FfiPoptatoClient, build: F) -> *mut FfiHttpRequest
where
    F: FnOnce(&PoptatoClient) -> Option<HttpRequest> + UnwindSafe,
{
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match build(&client.inner) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request for one page of the today list.
///
/// Returns null if `client` is null.
/// The caller must free the returned pointer with `poptato_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_build_today_list(
    client: *const FfiPoptatoClient,
    page: u32,
    size: u32,
) -> *mut FfiHttpRequest {
    build_request(client, move |c| Some(c.build_today_list(page, size)))
}

/// Build the request for one page of yesterday's unfinished todos.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_build_yesterday_list(
    client: *const FfiPoptatoClient,
    page: u32,
    size: u32,
) -> *mut FfiHttpRequest {
    build_request(client, move |c| Some(c.build_yesterday_list(page, size)))
}

/// Build the request that moves a todo to tomorrow.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_build_swipe(client: *const FfiPoptatoClient, todo_id: i64) -> *mut FfiHttpRequest {
    build_request(client, move |c| c.build_swipe(todo_id).ok())
}

#[unsafe(no_mangle)]
pub extern "C" fn poptato_build_toggle_completion(
    client: *const FfiPoptatoClient,
    todo_id: i64,
) -> *mut FfiHttpRequest {
    build_request(client, move |c| Some(c.build_toggle_completion(todo_id)))
}

/// Build the request that stores the order of the today list.
///
/// `todo_ids` points to `len` ids in display order; it may be null only
/// when `len` is 0. Returns null if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_build_drag_and_drop(
    client: *const FfiPoptatoClient,
    todo_ids: *const i64,
    len: u32,
) -> *mut FfiHttpRequest {
    build_request(client, move |c| {
        let ids: &[TodoId] = if len == 0 {
            &[]
        } else if todo_ids.is_null() {
            return None;
        } else {
            unsafe { std::slice::from_raw_parts(todo_ids, len as usize) }
        };
        c.build_drag_and_drop(TODAY_ORDER_TYPE, ids).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn poptato_build_delete_todo(client: *const FfiPoptatoClient, todo_id: i64) -> *mut FfiHttpRequest {
    build_request(client, move |c| Some(c.build_delete_todo(todo_id)))
}

#[unsafe(no_mangle)]
pub extern "C" fn poptato_build_toggle_bookmark(
    client: *const FfiPoptatoClient,
    todo_id: i64,
) -> *mut FfiHttpRequest {
    build_request(client, move |c| Some(c.build_toggle_bookmark(todo_id)))
}

/// Build the request that sets or clears a deadline.
///
/// `deadline` is a `yyyy-MM-dd` string, or null to clear it.
/// Returns null if `client` is null or `deadline` is not a valid date.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_build_update_deadline(
    client: *const FfiPoptatoClient,
    todo_id: i64,
    deadline: *const c_char,
) -> *mut FfiHttpRequest {
    build_request(client, move |c| {
        let deadline = if deadline.is_null() {
            None
        } else {
            let raw = unsafe { CStr::from_ptr(deadline) }.to_str().ok()?;
            Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?)
        };
        c.build_update_deadline(todo_id, deadline).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn poptato_build_toggle_repeat(
    client: *const FfiPoptatoClient,
    todo_id: i64,
) -> *mut FfiHttpRequest {
    build_request(client, move |c| Some(c.build_toggle_repeat(todo_id)))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }
            .to_string_lossy()
            .into_owned()
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

/// Shared body of every parser: null and panic handling around `parse`.
fn parse_response<F>(
    client: *const FfiPoptatoClient,
    response: *const FfiHttpResponse,
    name: &str,
    parse: F,
) -> *mut FfiPoptatoResult
where
    F: FnOnce(&PoptatoClient, HttpResponse) -> *mut FfiPoptatoResult + UnwindSafe,
{
    catch_unwind(|| {
        if client.is_null() {
            return FfiPoptatoResult::null_arg("client");
        }
        if response.is_null() {
            return FfiPoptatoResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        parse(&client.inner, ffi_response_to_core(resp))
    })
    .unwrap_or_else(|_| FfiPoptatoResult::panic(&format!("panic in {name}")))
}

/// Parse the response to a today-list request.
///
/// Returns a result with `data_tag = TodayList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_parse_today_list(
    client: *const FfiPoptatoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPoptatoResult {
    parse_response(client, response, "poptato_parse_today_list", |c, resp| {
        match c.parse_today_list(resp) {
            Ok(list) => FfiPoptatoResult::ok_today_list(list.todays, list.total_page_count),
            Err(e) => FfiPoptatoResult::from_error(e),
        }
    })
}

/// Parse the response to a yesterday-list request.
///
/// Returns a result with `data_tag = YesterdayList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_parse_yesterday_list(
    client: *const FfiPoptatoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPoptatoResult {
    parse_response(client, response, "poptato_parse_yesterday_list", |c, resp| {
        match c.parse_yesterday_list(resp) {
            Ok(list) => FfiPoptatoResult::ok_yesterday_list(list.yesterdays, list.total_page_count),
            Err(e) => FfiPoptatoResult::from_error(e),
        }
    })
}

/// Parse the response to any mutation (swipe, completion, order, delete,
/// bookmark, deadline, repeat).
///
/// Returns a result with `data_tag = None` on any 2xx status.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_parse_ack(
    client: *const FfiPoptatoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPoptatoResult {
    parse_response(client, response, "poptato_parse_ack", |c, resp| match c.parse_ack(resp) {
        Ok(()) => FfiPoptatoResult::ok_empty(),
        Err(e) => FfiPoptatoResult::from_error(e),
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Free an `FfiHttpRequest` returned by any `poptato_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.path);
        free_c_string(req.body);
        for h in unsafe { from_c_array(req.headers, req.headers_len) } {
            free_c_string(h.key);
            free_c_string(h.value);
        }
    });
}

/// Free an `FfiPoptatoResult` returned by any `poptato_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_free_result(result: *mut FfiPoptatoResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::TodayList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiTodayList) };
                for item in unsafe { from_c_array(list.items, list.len) } {
                    free_c_string(item.content);
                    free_c_string(item.deadline);
                }
            }
            FfiDataTag::YesterdayList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiYesterdayList) };
                for item in unsafe { from_c_array(list.items, list.len) } {
                    free_c_string(item.content);
                }
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn poptato_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_URL: &str = "http://localhost:3000";

    fn new_client() -> *mut FfiPoptatoClient {
        let url = CString::new(BASE_URL).unwrap();
        poptato_client_new(url.as_ptr())
    }

    fn c_str(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
    }

    fn request_body(req: &FfiHttpRequest) -> serde_json::Value {
        serde_json::from_str(&c_str(req.body)).unwrap()
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client();
        assert!(!client.is_null());
        poptato_client_free(client);
    }

    #[test]
    fn client_new_null_returns_null() {
        let client = poptato_client_new(std::ptr::null());
        assert!(client.is_null());
    }

    #[test]
    fn client_free_null_is_safe() {
        poptato_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_today_list_returns_correct_request() {
        let client = new_client();
        let req = poptato_build_today_list(client, 0, 50);
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        assert!(matches!(req_ref.method, FfiHttpMethod::Get));
        assert_eq!(c_str(req_ref.path), "http://localhost:3000/todays?page=0&size=50");
        assert!(req_ref.body.is_null());
        assert!(req_ref.headers.is_null());
        assert_eq!(req_ref.headers_len, 0);

        poptato_free_request(req);
        poptato_client_free(client);
    }

    #[test]
    fn build_null_client_returns_null() {
        assert!(poptato_build_today_list(std::ptr::null(), 0, 50).is_null());
        assert!(poptato_build_toggle_completion(std::ptr::null(), 1).is_null());
    }

    #[test]
    fn build_swipe_is_patch_with_json_body() {
        let client = new_client();
        let req = poptato_build_swipe(client, 7);
        let req_ref = unsafe { &*req };
        assert!(matches!(req_ref.method, FfiHttpMethod::Patch));
        assert_eq!(c_str(req_ref.path), "http://localhost:3000/swipe");
        assert_eq!(req_ref.headers_len, 1);

        let header = unsafe { &*req_ref.headers };
        assert_eq!(c_str(header.key), "content-type");
        assert_eq!(c_str(header.value), "application/json");
        assert_eq!(request_body(req_ref)["todoId"], 7);

        poptato_free_request(req);
        poptato_client_free(client);
    }

    #[test]
    fn build_item_toggles_target_todo_paths() {
        let client = new_client();
        let cases = [
            (poptato_build_toggle_completion(client, 3), "/todo/3/achieve"),
            (poptato_build_toggle_bookmark(client, 3), "/todo/3/bookmark"),
            (poptato_build_toggle_repeat(client, 3), "/todo/3/repeat"),
        ];
        for (req, path) in cases {
            let req_ref = unsafe { &*req };
            assert!(matches!(req_ref.method, FfiHttpMethod::Patch));
            assert_eq!(c_str(req_ref.path), format!("{BASE_URL}{path}"));
            assert!(req_ref.body.is_null());
            poptato_free_request(req);
        }
        poptato_client_free(client);
    }

    #[test]
    fn build_delete_todo_is_delete() {
        let client = new_client();
        let req = poptato_build_delete_todo(client, 9);
        let req_ref = unsafe { &*req };
        assert!(matches!(req_ref.method, FfiHttpMethod::Delete));
        assert_eq!(c_str(req_ref.path), "http://localhost:3000/todo/9");

        poptato_free_request(req);
        poptato_client_free(client);
    }

    #[test]
    fn build_drag_and_drop_copies_ids_in_order() {
        let client = new_client();
        let ids = [4i64, 1, 8];
        let req = poptato_build_drag_and_drop(client, ids.as_ptr(), ids.len() as u32);
        let req_ref = unsafe { &*req };
        assert_eq!(c_str(req_ref.path), "http://localhost:3000/drag-and-drop");
        let body = request_body(req_ref);
        assert_eq!(body["type"], "TODAY");
        assert_eq!(body["todoIds"], serde_json::json!([4, 1, 8]));

        poptato_free_request(req);
        poptato_client_free(client);
    }

    #[test]
    fn build_drag_and_drop_empty_and_null_ids() {
        let client = new_client();
        let req = poptato_build_drag_and_drop(client, std::ptr::null(), 0);
        assert!(!req.is_null());
        assert_eq!(request_body(unsafe { &*req })["todoIds"], serde_json::json!([]));
        poptato_free_request(req);

        assert!(poptato_build_drag_and_drop(client, std::ptr::null(), 2).is_null());
        poptato_client_free(client);
    }

    #[test]
    fn build_update_deadline_sets_and_clears() {
        let client = new_client();
        let date = CString::new("2024-01-15").unwrap();
        let req = poptato_build_update_deadline(client, 2, date.as_ptr());
        let req_ref = unsafe { &*req };
        assert_eq!(c_str(req_ref.path), "http://localhost:3000/todo/2/deadline");
        assert_eq!(request_body(req_ref)["deadline"], "2024-01-15");
        poptato_free_request(req);

        let req = poptato_build_update_deadline(client, 2, std::ptr::null());
        assert!(request_body(unsafe { &*req })["deadline"].is_null());
        poptato_free_request(req);

        poptato_client_free(client);
    }

    #[test]
    fn build_update_deadline_rejects_bad_date() {
        let client = new_client();
        let date = CString::new("15/01/2024").unwrap();
        assert!(poptato_build_update_deadline(client, 2, date.as_ptr()).is_null());
        poptato_client_free(client);
    }

    #[test]
    fn parse_today_list_empty() {
        let client = new_client();
        let body = CString::new(r#"{"todays":[],"totalPageCount":0}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = poptato_parse_today_list(client, &resp);
        assert!(!result.is_null());

        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::Ok));
        assert!(r.error_message.is_null());
        assert!(matches!(r.data_tag, FfiDataTag::TodayList));

        let list = unsafe { &*(r.data as *const FfiTodayList) };
        assert_eq!(list.len, 0);
        assert!(list.items.is_null());

        poptato_free_result(result);
        poptato_client_free(client);
    }

    #[test]
    fn parse_today_list_two_items() {
        let client = new_client();
        let body = CString::new(
            r#"{"todays":[
                {"todoId":1,"content":"First","todayStatus":"INCOMPLETE","isBookmark":true,"dday":3,"deadline":"2024-01-13","isRepeat":false},
                {"todoId":2,"content":"Second","todayStatus":"COMPLETED","isBookmark":false,"dday":null,"deadline":null,"isRepeat":true}
            ],"totalPageCount":1}"#,
        )
        .unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = poptato_parse_today_list(client, &resp);
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::Ok));

        let list = unsafe { &*(r.data as *const FfiTodayList) };
        assert_eq!(list.len, 2);
        assert_eq!(list.total_page_count, 1);

        let items = unsafe { std::slice::from_raw_parts(list.items, list.len as usize) };
        assert_eq!(items[0].id, 1);
        assert_eq!(c_str(items[0].content), "First");
        assert!(!items[0].completed);
        assert!(items[0].is_bookmark);
        assert!(items[0].has_dday);
        assert_eq!(items[0].dday, 3);
        assert_eq!(c_str(items[0].deadline), "2024-01-13");

        assert_eq!(c_str(items[1].content), "Second");
        assert!(items[1].completed);
        assert!(!items[1].has_dday);
        assert!(items[1].deadline.is_null());
        assert!(items[1].is_repeat);

        poptato_free_result(result);
        poptato_client_free(client);
    }

    #[test]
    fn parse_today_list_bad_json() {
        let client = new_client();
        let body = CString::new("not json").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = poptato_parse_today_list(client, &resp);
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::Deserialization));
        assert!(r.data.is_null());

        poptato_free_result(result);
        poptato_client_free(client);
    }

    #[test]
    fn parse_yesterday_list_items() {
        let client = new_client();
        let body = CString::new(r#"{"yesterdays":[{"todoId":5,"content":"Old"}],"totalPageCount":1}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = poptato_parse_yesterday_list(client, &resp);
        let r = unsafe { &*result };
        assert!(matches!(r.data_tag, FfiDataTag::YesterdayList));

        let list = unsafe { &*(r.data as *const FfiYesterdayList) };
        assert_eq!(list.len, 1);
        let item = unsafe { &*list.items };
        assert_eq!(item.id, 5);
        assert_eq!(c_str(item.content), "Old");

        poptato_free_result(result);
        poptato_client_free(client);
    }

    #[test]
    fn parse_ack_accepts_no_content() {
        let client = new_client();
        let resp = FfiHttpResponse {
            status: 204,
            body: std::ptr::null(),
        };
        let result = poptato_parse_ack(client, &resp);
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::Ok));
        assert!(matches!(r.data_tag, FfiDataTag::None));
        assert!(r.data.is_null());

        poptato_free_result(result);
        poptato_client_free(client);
    }

    #[test]
    fn parse_ack_not_found() {
        let client = new_client();
        let body = CString::new("").unwrap();
        let resp = FfiHttpResponse {
            status: 404,
            body: body.as_ptr(),
        };
        let result = poptato_parse_ack(client, &resp);
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::NotFound));
        assert_eq!(r.http_status, 404);
        assert!(!r.error_message.is_null());

        poptato_free_result(result);
        poptato_client_free(client);
    }

    #[test]
    fn parse_ack_server_error_keeps_status() {
        let client = new_client();
        let body = CString::new("boom").unwrap();
        let resp = FfiHttpResponse {
            status: 500,
            body: body.as_ptr(),
        };
        let result = poptato_parse_ack(client, &resp);
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::Http));
        assert_eq!(r.http_status, 500);

        poptato_free_result(result);
        poptato_client_free(client);
    }

    #[test]
    fn parse_null_client_returns_null_arg() {
        let body = CString::new("").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = poptato_parse_ack(std::ptr::null(), &resp);
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::NullArg));
        assert_eq!(c_str(r.error_message), "null argument: client");

        poptato_free_result(result);
    }

    #[test]
    fn parse_null_response_returns_null_arg() {
        let client = new_client();
        let result = poptato_parse_today_list(client, std::ptr::null());
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::NullArg));

        poptato_free_result(result);
        poptato_client_free(client);
    }

    #[test]
    fn free_request_null_is_safe() {
        poptato_free_request(std::ptr::null_mut());
    }

    #[test]
    fn free_result_null_is_safe() {
        poptato_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        poptato_free_string(std::ptr::null_mut());
    }
}
