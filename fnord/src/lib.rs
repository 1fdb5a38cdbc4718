//! fnord 本地库示例
//!
//! 为 `Test` 类导出五个入口点，供 `native_fixtures` 通过动态加载绑定。
//! 返回的字符串以 NUL 结尾，在同一线程下一次调用前保持有效。

#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

static FNORD2: &[u8] = b"fnord2()\0";

thread_local! {
    static LAST_TEXT: RefCell<CString> = RefCell::new(CString::default());
}

fn hold(text: String) -> *const c_char {
    let text = CString::new(text).unwrap_or_default();
    LAST_TEXT.with(|slot| {
        *slot.borrow_mut() = text;
        slot.borrow().as_ptr()
    })
}

#[no_mangle]
pub extern "C" fn Java_Test_fnord__() {
    println!("fnord()");
}

#[no_mangle]
pub extern "C" fn Java_Test_fnord__I(i: i32) {
    println!("fnord({})", i);
}

#[no_mangle]
pub unsafe extern "C" fn Java_Test_fnord__ILjava_lang_String_2(i: i32, s: *const c_char) {
    let s = if s.is_null() {
        String::new()
    } else {
        CStr::from_ptr(s).to_string_lossy().into_owned()
    };
    println!("fnord({}, {:?})", i, s);
}

#[no_mangle]
pub extern "C" fn Java_Test_fnord2__() -> *const c_char {
    FNORD2.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn Java_Test_fnord2__I(i: i32) -> *const c_char {
    hold(format!("fnord2({})", i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returned_strings() {
        let text = unsafe { CStr::from_ptr(Java_Test_fnord2__()) };
        assert_eq!(text.to_str().unwrap(), "fnord2()");

        let text = unsafe { CStr::from_ptr(Java_Test_fnord2__I(9)) };
        assert_eq!(text.to_str().unwrap(), "fnord2(9)");
    }

    #[test]
    fn test_text_argument() {
        let arg = CString::new("hello").unwrap();
        unsafe { Java_Test_fnord__ILjava_lang_String_2(1, arg.as_ptr()) };
        unsafe { Java_Test_fnord__ILjava_lang_String_2(1, std::ptr::null()) };
    }
}
