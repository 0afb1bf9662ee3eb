//! Exposes a [`VfsRegistry`] to the engine as one `sqlite3_vfs`.
//!
//! Every entry of the engine's dispatch table lands on the registry:
//!
//! - `xOpen` goes through [`VfsRegistry::open`], which routes by object kind
//! - `xDelete`, `xAccess` and `xFullPathname` go to the backend resolving
//!   [`Service::Open`]
//! - randomness, clock and last error go to their resolved providers
//! - the extension-loading hooks decline through the default backend
//!
//! Open files live inside the engine-allocated `sqlite3_file` as a boxed
//! [`VfsFile`]; the `sqlite3_io_methods` table forwards each call to it.

use crate::error::{SqliteError, SqliteResult};
use rangevfs_core::{
    write_c_message, AccessMode, DlHandle, LockLevel, OpenFlags, ResultCode, Service, SyncFlags,
    VfsError, VfsFile, VfsRegistry, VfsResult, DL_UNSUPPORTED_MESSAGE, MILLIS_PER_DAY,
};
use rusqlite::ffi;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Name prefix used when the registry has no default backend name.
const FALLBACK_PREFIX: &str = "rangevfs";

/// Bounds for the path length advertised to the engine.
const MIN_PATHNAME: usize = 64;
const MAX_PATHNAME: usize = 65_536;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The engine-allocated file object. `base` must stay first.
#[repr(C)]
struct FileSlot {
    base: ffi::sqlite3_file,
    file: Option<Box<dyn VfsFile>>,
}

/// A registry registered with the engine.
///
/// The registration lives as long as this value. Connections opened through
/// it hold an `Arc` so it cannot be dropped underneath them. Each
/// registration gets a unique name (`<default backend>-<n>`), so any number
/// of registries can be bound at once.
pub struct EngineVfs {
    name: String,
    raw: NonNull<ffi::sqlite3_vfs>,
    registry: Arc<VfsRegistry>,
    // Backs `raw.zName`; dropped after the engine forgets it.
    _c_name: CString,
}

// SAFETY: `raw` is only read by the engine, which serializes access to its
// vfs list. The registry behind `pAppData` is `Send + Sync`.
unsafe impl Send for EngineVfs {}
unsafe impl Sync for EngineVfs {}

impl EngineVfs {
    /// Validates `registry` and registers it with the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if a service has no provider or the engine rejects
    /// the registration.
    pub fn register(registry: VfsRegistry) -> SqliteResult<Arc<Self>> {
        Self::register_shared(Arc::new(registry))
    }

    /// Registers a registry that is shared with other owners.
    ///
    /// # Errors
    ///
    /// Returns an error if a service has no provider or the engine rejects
    /// the registration.
    pub fn register_shared(registry: Arc<VfsRegistry>) -> SqliteResult<Arc<Self>> {
        registry.validate()?;

        let prefix = registry.default_name().unwrap_or(FALLBACK_PREFIX);
        let name = format!("{prefix}-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed));
        let c_name = CString::new(name.clone()).map_err(|_| {
            VfsError::Registration {
                backend: name.clone(),
                reason: "name contains a NUL byte".into(),
            }
        })?;

        let max_pathname = registry
            .resolve(Service::Open)?
            .max_pathname()
            .clamp(MIN_PATHNAME, MAX_PATHNAME);

        let raw = Box::new(ffi::sqlite3_vfs {
            iVersion: 2,
            szOsFile: std::mem::size_of::<FileSlot>() as c_int,
            mxPathname: max_pathname as c_int,
            pNext: ptr::null_mut(),
            zName: c_name.as_ptr(),
            pAppData: Arc::into_raw(Arc::clone(&registry)) as *mut c_void,
            xOpen: Some(x_open),
            xDelete: Some(x_delete),
            xAccess: Some(x_access),
            xFullPathname: Some(x_full_pathname),
            xDlOpen: Some(x_dl_open),
            xDlError: Some(x_dl_error),
            // Never reached: xDlOpen declines every library.
            xDlSym: None,
            xDlClose: Some(x_dl_close),
            xRandomness: Some(x_randomness),
            xSleep: Some(x_sleep),
            xCurrentTime: Some(x_current_time),
            xGetLastError: Some(x_get_last_error),
            xCurrentTimeInt64: Some(x_current_time_int64),
            xSetSystemCall: None,
            xGetSystemCall: None,
            xNextSystemCall: None,
        });
        let raw = NonNull::from(Box::leak(raw));

        // SAFETY: `raw` points to a fully initialized vfs whose name and app
        // data outlive the registration; `Drop` unregisters before freeing.
        let rc = unsafe { ffi::sqlite3_vfs_register(raw.as_ptr(), 0) };
        if rc != ffi::SQLITE_OK {
            // SAFETY: the engine did not take the vfs; reclaim what we leaked.
            unsafe { free_vfs(raw) };
            warn!(name = %name, rc, "engine rejected registration");
            return Err(SqliteError::Register { name, code: rc });
        }

        debug!(name = %name, backends = ?registry.names(), "registered with engine");
        Ok(Arc::new(Self {
            name,
            raw,
            registry,
            _c_name: c_name,
        }))
    }

    /// Returns the name connections use to select this registration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the registry behind the registration.
    #[must_use]
    pub fn registry(&self) -> &VfsRegistry {
        &self.registry
    }
}

impl Drop for EngineVfs {
    fn drop(&mut self) {
        // SAFETY: `raw` was registered in `register_shared` and no connection
        // can still use it, since each one holds an `Arc` to `self`.
        unsafe {
            ffi::sqlite3_vfs_unregister(self.raw.as_ptr());
            free_vfs(self.raw);
        }
        debug!(name = %self.name, "unregistered from engine");
    }
}

impl std::fmt::Debug for EngineVfs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineVfs")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Frees a vfs built by [`EngineVfs::register_shared`].
///
/// # Safety
///
/// `raw` must come from `register_shared` and be unknown to the engine.
unsafe fn free_vfs(raw: NonNull<ffi::sqlite3_vfs>) {
    let vfs = Box::from_raw(raw.as_ptr());
    drop(Arc::from_raw(vfs.pAppData as *const VfsRegistry));
}

fn code(code: ResultCode) -> c_int {
    i32::from(code)
}

fn engine_code(err: &VfsError) -> c_int {
    code(err.code())
}

fn status(result: VfsResult<()>) -> c_int {
    match result {
        Ok(()) => code(ResultCode::Ok),
        Err(err) => {
            trace!(%err, "file operation failed");
            engine_code(&err)
        }
    }
}

fn lock_level(level: c_int) -> LockLevel {
    match level {
        1 => LockLevel::Shared,
        2 => LockLevel::Reserved,
        3 => LockLevel::Pending,
        4 => LockLevel::Exclusive,
        _ => LockLevel::None,
    }
}

fn access_mode(flags: c_int) -> AccessMode {
    match flags {
        1 => AccessMode::ReadWrite,
        2 => AccessMode::Read,
        _ => AccessMode::Exists,
    }
}

// The engine guarantees every pointer argument is valid for the duration of
// a call and that a file is used by one thread at a time.

unsafe fn registry<'a>(vfs: *mut ffi::sqlite3_vfs) -> &'a VfsRegistry {
    &*((*vfs).pAppData as *const VfsRegistry)
}

unsafe fn c_path<'a>(name: *const c_char) -> Result<Option<&'a str>, c_int> {
    if name.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(name)
        .to_str()
        .map(Some)
        .map_err(|_| code(ResultCode::CantOpen))
}

unsafe fn out_buffer<'a>(out: *mut c_char, len: c_int) -> &'a mut [u8] {
    if out.is_null() || len <= 0 {
        return &mut [];
    }
    std::slice::from_raw_parts_mut(out.cast::<u8>(), len as usize)
}

unsafe fn file<'a>(handle: *mut ffi::sqlite3_file) -> Option<&'a mut Box<dyn VfsFile>> {
    (*handle.cast::<FileSlot>()).file.as_mut()
}

unsafe extern "C" fn x_open(
    vfs: *mut ffi::sqlite3_vfs,
    name: *const c_char,
    out_file: *mut ffi::sqlite3_file,
    flags: c_int,
    out_flags: *mut c_int,
) -> c_int {
    (*out_file).pMethods = ptr::null();
    let path = match c_path(name) {
        Ok(path) => path,
        Err(rc) => return rc,
    };

    match registry(vfs).open(path, OpenFlags::from_bits(flags as u32)) {
        Ok(opened) => {
            let slot = out_file.cast::<FileSlot>();
            ptr::addr_of_mut!((*slot).file).write(Some(opened.file));
            (*out_file).pMethods = &IO_METHODS;
            if !out_flags.is_null() {
                *out_flags = opened.flags.bits() as c_int;
            }
            code(ResultCode::Ok)
        }
        Err(err) => {
            debug!(path = path.unwrap_or("<anonymous>"), %err, "engine open refused");
            engine_code(&err)
        }
    }
}

unsafe extern "C" fn x_delete(vfs: *mut ffi::sqlite3_vfs, name: *const c_char, sync_dir: c_int) -> c_int {
    let Ok(Some(path)) = c_path(name) else {
        return code(ResultCode::IoErrDelete);
    };
    let result = registry(vfs)
        .resolve(Service::Open)
        .and_then(|vfs| vfs.delete(path, sync_dir != 0));
    status(result)
}

unsafe extern "C" fn x_access(
    vfs: *mut ffi::sqlite3_vfs,
    name: *const c_char,
    flags: c_int,
    out: *mut c_int,
) -> c_int {
    let Ok(Some(path)) = c_path(name) else {
        return code(ResultCode::IoErrAccess);
    };
    let result = registry(vfs)
        .resolve(Service::Open)
        .and_then(|vfs| vfs.access(path, access_mode(flags)));
    match result {
        Ok(accessible) => {
            *out = c_int::from(accessible);
            code(ResultCode::Ok)
        }
        Err(err) => engine_code(&err),
    }
}

unsafe extern "C" fn x_full_pathname(
    vfs: *mut ffi::sqlite3_vfs,
    name: *const c_char,
    n_out: c_int,
    out: *mut c_char,
) -> c_int {
    let Ok(Some(path)) = c_path(name) else {
        return code(ResultCode::CantOpen);
    };
    let full = match registry(vfs)
        .resolve(Service::Open)
        .and_then(|vfs| vfs.full_pathname(path))
    {
        Ok(full) => full,
        Err(err) => return engine_code(&err),
    };

    let buf = out_buffer(out, n_out);
    if full.len() >= buf.len() {
        return code(ResultCode::CantOpen);
    }
    write_c_message(buf, &full);
    code(ResultCode::Ok)
}

unsafe extern "C" fn x_dl_open(vfs: *mut ffi::sqlite3_vfs, name: *const c_char) -> *mut c_void {
    let (Some(default), Ok(Some(path))) = (registry(vfs).default_vfs(), c_path(name)) else {
        return ptr::null_mut();
    };
    match default.dl_open(path) {
        Some(DlHandle(handle)) => handle as *mut c_void,
        None => ptr::null_mut(),
    }
}

unsafe extern "C" fn x_dl_error(vfs: *mut ffi::sqlite3_vfs, n_byte: c_int, out: *mut c_char) {
    let buf = out_buffer(out, n_byte);
    match registry(vfs).default_vfs() {
        Some(default) => default.dl_error(buf),
        None => {
            write_c_message(buf, DL_UNSUPPORTED_MESSAGE);
        }
    }
}

unsafe extern "C" fn x_dl_close(vfs: *mut ffi::sqlite3_vfs, handle: *mut c_void) {
    if let Some(default) = registry(vfs).default_vfs() {
        default.dl_close(DlHandle(handle as usize));
    }
}

unsafe extern "C" fn x_randomness(vfs: *mut ffi::sqlite3_vfs, n_byte: c_int, out: *mut c_char) -> c_int {
    let buf = out_buffer(out, n_byte);
    match registry(vfs).randomness(buf) {
        Ok(written) => written as c_int,
        Err(err) => {
            warn!(%err, "randomness unavailable");
            0
        }
    }
}

unsafe extern "C" fn x_sleep(_vfs: *mut ffi::sqlite3_vfs, micros: c_int) -> c_int {
    std::thread::sleep(Duration::from_micros(micros.max(0) as u64));
    micros
}

unsafe extern "C" fn x_current_time(vfs: *mut ffi::sqlite3_vfs, out: *mut f64) -> c_int {
    match registry(vfs).current_time() {
        Ok(millis) => {
            *out = millis as f64 / MILLIS_PER_DAY as f64;
            code(ResultCode::Ok)
        }
        Err(err) => engine_code(&err),
    }
}

unsafe extern "C" fn x_current_time_int64(vfs: *mut ffi::sqlite3_vfs, out: *mut i64) -> c_int {
    match registry(vfs).current_time() {
        Ok(millis) => {
            *out = millis;
            code(ResultCode::Ok)
        }
        Err(err) => engine_code(&err),
    }
}

unsafe extern "C" fn x_get_last_error(vfs: *mut ffi::sqlite3_vfs, n_byte: c_int, out: *mut c_char) -> c_int {
    let buf = out_buffer(out, n_byte);
    registry(vfs).last_error(buf).unwrap_or(0)
}

static IO_METHODS: ffi::sqlite3_io_methods = ffi::sqlite3_io_methods {
    iVersion: 1,
    xClose: Some(x_close),
    xRead: Some(x_read),
    xWrite: Some(x_write),
    xTruncate: Some(x_truncate),
    xSync: Some(x_sync),
    xFileSize: Some(x_file_size),
    xLock: Some(x_lock),
    xUnlock: Some(x_unlock),
    xCheckReservedLock: Some(x_check_reserved_lock),
    xFileControl: Some(x_file_control),
    xSectorSize: Some(x_sector_size),
    xDeviceCharacteristics: Some(x_device_characteristics),
    xShmMap: None,
    xShmLock: None,
    xShmBarrier: None,
    xShmUnmap: None,
    xFetch: None,
    xUnfetch: None,
};

unsafe extern "C" fn x_close(handle: *mut ffi::sqlite3_file) -> c_int {
    match (*handle.cast::<FileSlot>()).file.take() {
        Some(mut file) => status(file.close()),
        None => code(ResultCode::Ok),
    }
}

unsafe extern "C" fn x_read(
    handle: *mut ffi::sqlite3_file,
    buf: *mut c_void,
    amount: c_int,
    offset: i64,
) -> c_int {
    let Some(file) = file(handle) else {
        return code(ResultCode::Misuse);
    };
    let buf = out_buffer(buf.cast::<c_char>(), amount);
    match file.read(buf, offset as u64) {
        Ok(read) => i32::from(read.code()),
        Err(err) => engine_code(&err),
    }
}

unsafe extern "C" fn x_write(
    handle: *mut ffi::sqlite3_file,
    buf: *const c_void,
    amount: c_int,
    offset: i64,
) -> c_int {
    let Some(file) = file(handle) else {
        return code(ResultCode::Misuse);
    };
    let data: &[u8] = if buf.is_null() || amount <= 0 {
        &[]
    } else {
        std::slice::from_raw_parts(buf.cast::<u8>(), amount as usize)
    };
    status(file.write(data, offset as u64))
}

unsafe extern "C" fn x_truncate(handle: *mut ffi::sqlite3_file, size: i64) -> c_int {
    let Some(file) = file(handle) else {
        return code(ResultCode::Misuse);
    };
    status(file.truncate(size.max(0) as u64))
}

unsafe extern "C" fn x_sync(handle: *mut ffi::sqlite3_file, flags: c_int) -> c_int {
    let Some(file) = file(handle) else {
        return code(ResultCode::Misuse);
    };
    status(file.sync(SyncFlags::from_bits(flags as u32)))
}

unsafe extern "C" fn x_file_size(handle: *mut ffi::sqlite3_file, out: *mut i64) -> c_int {
    let Some(file) = file(handle) else {
        return code(ResultCode::Misuse);
    };
    match file.file_size() {
        Ok(size) => {
            *out = i64::try_from(size).unwrap_or(i64::MAX);
            code(ResultCode::Ok)
        }
        Err(err) => engine_code(&err),
    }
}

unsafe extern "C" fn x_lock(handle: *mut ffi::sqlite3_file, level: c_int) -> c_int {
    let Some(file) = file(handle) else {
        return code(ResultCode::Misuse);
    };
    status(file.lock(lock_level(level)))
}

unsafe extern "C" fn x_unlock(handle: *mut ffi::sqlite3_file, level: c_int) -> c_int {
    let Some(file) = file(handle) else {
        return code(ResultCode::Misuse);
    };
    status(file.unlock(lock_level(level)))
}

unsafe extern "C" fn x_check_reserved_lock(handle: *mut ffi::sqlite3_file, out: *mut c_int) -> c_int {
    let Some(file) = file(handle) else {
        return code(ResultCode::Misuse);
    };
    match file.check_reserved_lock() {
        Ok(reserved) => {
            *out = c_int::from(reserved);
            code(ResultCode::Ok)
        }
        Err(err) => engine_code(&err),
    }
}

unsafe extern "C" fn x_file_control(handle: *mut ffi::sqlite3_file, op: c_int, _arg: *mut c_void) -> c_int {
    let Some(file) = file(handle) else {
        return code(ResultCode::NotFound);
    };
    status(file.file_control(op))
}

unsafe extern "C" fn x_sector_size(handle: *mut ffi::sqlite3_file) -> c_int {
    file(handle).map_or(0, |file| file.sector_size() as c_int)
}

unsafe extern "C" fn x_device_characteristics(handle: *mut ffi::sqlite3_file) -> c_int {
    file(handle).map_or(0, |file| file.device_characteristics().bits() as c_int)
}
