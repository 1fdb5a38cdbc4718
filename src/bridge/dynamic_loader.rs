//! 动态库加载器
//!
//! 在搜索路径中按平台文件名（`libfnord.so`、`fnord.dll` 等）查找本地库，
//! 并按方法表解析全部五个导出符号。任何符号缺失都会使加载失败。
//!
//! 导出符号的 C ABI：
//!
//! ```text
//! void        Java_<类>_fnord__(void);
//! void        Java_<类>_fnord__I(int32_t);
//! void        Java_<类>_fnord__ILjava_lang_String_2(int32_t, const char*);
//! const char* Java_<类>_fnord2__(void);
//! const char* Java_<类>_fnord2__I(int32_t);
//! ```
//!
//! 返回的字符串以 NUL 结尾，归库所有，调用方立即复制。

#![allow(unsafe_code)]

use super::table::{EntryPoint, NativeMethodTable};
use super::NativeMethods;
use crate::{FixtureError, Result};
use libloading::{Library, Symbol};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type VoidFn = unsafe extern "C" fn();
type VoidIntFn = unsafe extern "C" fn(i32);
type VoidIntTextFn = unsafe extern "C" fn(i32, *const c_char);
type TextFn = unsafe extern "C" fn() -> *const c_char;
type TextIntFn = unsafe extern "C" fn(i32) -> *const c_char;

/// 动态库加载器
#[derive(Debug, Clone)]
pub struct DynamicLoader {
    search_paths: Vec<PathBuf>,
}

impl Default for DynamicLoader {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from(".")],
        }
    }
}

impl DynamicLoader {
    /// 以当前目录为首个搜索路径
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用给定搜索路径，不含默认的当前目录
    pub fn with_search_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut loader = Self {
            search_paths: Vec::new(),
        };
        for path in paths {
            loader.add_search_path(path);
        }
        loader
    }

    /// 追加搜索路径，重复路径忽略
    pub fn add_search_path<P: Into<PathBuf>>(&mut self, path: P) {
        let path = path.into();
        if !self.search_paths.contains(&path) {
            debug!("Added native library search path: {:?}", path);
            self.search_paths.push(path);
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// 平台相关的库文件名
    pub fn file_name(library: &str) -> PathBuf {
        PathBuf::from(libloading::library_filename(library))
    }

    /// 按搜索路径顺序查找，首个存在的文件胜出
    pub fn locate(&self, library: &str) -> Option<PathBuf> {
        let file_name = Self::file_name(library);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| {
                debug!("Probing native library candidate {:?}", candidate);
                candidate.is_file()
            })
    }

    /// 查找并加载库
    pub fn load(&self, library: &str, table: &NativeMethodTable) -> Result<DynamicLibraryProvider> {
        let path = self.locate(library).ok_or_else(|| {
            FixtureError::bind(
                library,
                &format!(
                    "{:?} not found in search paths {:?}",
                    Self::file_name(library),
                    self.search_paths
                ),
            )
        })?;
        DynamicLibraryProvider::open(library, &path, table)
    }
}

/// 已解析的入口点
#[derive(Clone, Copy)]
struct EntryTable {
    fnord: VoidFn,
    fnord_int: VoidIntFn,
    fnord_int_text: VoidIntTextFn,
    fnord2: TextFn,
    fnord2_int: TextIntFn,
}

/// 由动态库提供的本地方法实现
pub struct DynamicLibraryProvider {
    library_name: String,
    path: PathBuf,
    entries: EntryTable,
    // 入口点指针依赖库保持加载
    _library: Library,
}

impl DynamicLibraryProvider {
    /// 打开指定路径的库并解析全部入口点
    pub fn open(library_name: &str, path: &Path, table: &NativeMethodTable) -> Result<Self> {
        // 加载库会执行其初始化代码
        let library = unsafe { Library::new(path) }.map_err(|e| {
            FixtureError::bind(library_name, &format!("failed to load {:?}: {}", path, e))
        })?;

        let entries = {
            let symbol = |entry: EntryPoint| -> Result<String> {
                table
                    .get(entry)
                    .map(|method| method.symbol_name(table.class_name()))
                    .ok_or_else(|| {
                        FixtureError::bind(
                            library_name,
                            &format!("method table has no entry for {:?}", entry),
                        )
                    })
            };

            EntryTable {
                fnord: resolve::<VoidFn>(&library, library_name, &symbol(EntryPoint::Fnord)?)?,
                fnord_int: resolve::<VoidIntFn>(
                    &library,
                    library_name,
                    &symbol(EntryPoint::FnordInt)?,
                )?,
                fnord_int_text: resolve::<VoidIntTextFn>(
                    &library,
                    library_name,
                    &symbol(EntryPoint::FnordIntText)?,
                )?,
                fnord2: resolve::<TextFn>(&library, library_name, &symbol(EntryPoint::Fnord2)?)?,
                fnord2_int: resolve::<TextIntFn>(
                    &library,
                    library_name,
                    &symbol(EntryPoint::Fnord2Int)?,
                )?,
            }
        };

        info!("Loaded native library '{}' from {:?}", library_name, path);
        Ok(Self {
            library_name: library_name.to_string(),
            path: path.to_path_buf(),
            entries,
            _library: library,
        })
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn copy_text(&self, method: &str, ptr: *const c_char) -> Result<String> {
        if ptr.is_null() {
            return Err(FixtureError::native(&format!(
                "{}::{} returned a null string",
                self.library_name, method
            )));
        }
        // 库保证返回 NUL 结尾的字符串，且在本次调用后仍有效
        let text = unsafe { CStr::from_ptr(ptr) };
        Ok(text.to_string_lossy().into_owned())
    }
}

impl std::fmt::Debug for DynamicLibraryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicLibraryProvider")
            .field("library_name", &self.library_name)
            .field("path", &self.path)
            .finish()
    }
}

fn resolve<T: Copy>(library: &Library, library_name: &str, name: &str) -> Result<T> {
    let mut symbol_name = name.as_bytes().to_vec();
    symbol_name.push(0);
    // 符号类型由方法表的描述符决定
    let symbol: Symbol<T> = unsafe { library.get(&symbol_name) }.map_err(|_| {
        FixtureError::SymbolMissing {
            library: library_name.to_string(),
            symbol: name.to_string(),
        }
    })?;
    debug!("Resolved native symbol {}", name);
    Ok(*symbol)
}

impl NativeMethods for DynamicLibraryProvider {
    fn fnord(&self) -> Result<()> {
        unsafe { (self.entries.fnord)() };
        Ok(())
    }

    fn fnord_int(&self, i: i32) -> Result<()> {
        unsafe { (self.entries.fnord_int)(i) };
        Ok(())
    }

    fn fnord_int_text(&self, i: i32, s: &str) -> Result<()> {
        let text = CString::new(s)
            .map_err(|e| FixtureError::native(&format!("text argument contains NUL: {}", e)))?;
        unsafe { (self.entries.fnord_int_text)(i, text.as_ptr()) };
        Ok(())
    }

    fn fnord2(&self) -> Result<String> {
        let ptr = unsafe { (self.entries.fnord2)() };
        self.copy_text("fnord2", ptr)
    }

    fn fnord2_int(&self, i: i32) -> Result<String> {
        let ptr = unsafe { (self.entries.fnord2_int)(i) };
        self.copy_text("fnord2", ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_search_path_is_cwd() {
        let loader = DynamicLoader::new();
        assert_eq!(loader.search_paths(), &[PathBuf::from(".")]);
    }

    #[test]
    fn test_search_paths_deduplicated_in_order() {
        let mut loader = DynamicLoader::with_search_paths(["a", "b"]);
        loader.add_search_path("a");
        loader.add_search_path("c");
        assert_eq!(
            loader.search_paths(),
            &[PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")]
        );
    }

    #[test]
    fn test_file_name_is_platform_specific() {
        let name = DynamicLoader::file_name("fnord");
        let name = name.to_string_lossy();
        assert!(name.contains("fnord"));
        assert!(name.ends_with(std::env::consts::DLL_SUFFIX));
    }

    #[test]
    fn test_locate_first_match_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let file_name = DynamicLoader::file_name("fnord");
        std::fs::write(second.path().join(&file_name), b"").unwrap();

        let loader = DynamicLoader::with_search_paths([first.path(), second.path()]);
        assert_eq!(loader.locate("fnord"), Some(second.path().join(&file_name)));

        std::fs::write(first.path().join(&file_name), b"").unwrap();
        assert_eq!(loader.locate("fnord"), Some(first.path().join(&file_name)));
    }

    #[test]
    fn test_load_missing_library_fails_to_bind() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DynamicLoader::with_search_paths([dir.path()]);
        let table = NativeMethodTable::standard("Test").unwrap();
        let err = loader.load("does_not_exist", &table).unwrap_err();
        assert!(matches!(err, FixtureError::Bind { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_invalid_library_fails_to_bind() {
        let dir = tempfile::tempdir().unwrap();
        let file_name = DynamicLoader::file_name("garbage");
        std::fs::write(dir.path().join(&file_name), b"not a shared object").unwrap();

        let loader = DynamicLoader::with_search_paths([dir.path()]);
        let table = NativeMethodTable::standard("Test").unwrap();
        let err = loader.load("garbage", &table).unwrap_err();
        assert!(matches!(err, FixtureError::Bind { .. }));
    }
}
