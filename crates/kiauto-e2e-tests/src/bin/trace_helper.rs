//! Makes the calls KiCad would, with the interposer preloaded, and prints
//! `HOST:` lines for what came back.

use std::ffi::{CStr, CString, OsString};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

use libc::{c_char, c_int, c_void, FILE};

type SetTextFn = unsafe extern "C" fn(*mut c_void, *const c_char, c_int);
type GetFilenameFn = unsafe extern "C" fn(*mut c_void) -> *mut c_char;
type FreeFn = unsafe extern "C" fn(*mut c_void);
type PrintRunFn = unsafe extern "C" fn(*mut c_void, c_int, *mut c_void, *mut *mut c_void) -> c_int;
type SetTooltipFn = unsafe extern "C" fn(*mut c_void, *mut c_void, *const c_char, *const c_char);
type SetTooltipTextFn = unsafe extern "C" fn(*mut c_void, *const c_char);
type ToolbarInsertFn = unsafe extern "C" fn(*mut c_void, *mut c_void, c_int);

/// `GTK_PRINT_OPERATION_ACTION_PRINT_DIALOG`
const PRINT_DIALOG: c_int = 0;

fn main() {
    let args: Vec<OsString> = std::env::args_os().collect();
    if args.len() < 2 {
        usage();
    }

    let command = args[1].to_string_lossy();
    let rest = &args[2..];

    unsafe {
        match command.as_ref() {
            "io" => io_calls(rest),
            "pango" => pango_calls(),
            "chooser" => chooser_call(),
            "print" => print_call(),
            "toolbar" => toolbar_calls(),
            _ => {
                let _ = writeln!(io::stderr(), "Unknown command: {}", command);
                usage();
            }
        }
    }
}

fn usage() -> ! {
    let _ = writeln!(
        io::stderr(),
        "Usage: trace_helper <io DIR|pango|chooser|print|toolbar>"
    );
    std::process::exit(1);
}

/// Look `name` up in the global scope, where the interposer comes first
unsafe fn symbol<F: Copy>(name: &CStr) -> F {
    let p = libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr());
    if p.is_null() {
        let _ = writeln!(io::stderr(), "{} is not loaded", name.to_string_lossy());
        std::process::exit(2);
    }
    std::mem::transmute_copy::<*mut c_void, F>(&p)
}

fn host_line(what: &str, detail: &[u8]) {
    let line = [&b"HOST:"[..], what.as_bytes(), &b":"[..], detail, &b"\n"[..]].concat();
    let mut out = io::stdout().lock();
    let _ = out.write_all(&line).and_then(|()| out.flush());
}

fn c_path(path: &Path) -> CString {
    CString::new(path.as_os_str().as_bytes()).unwrap_or_default()
}

/// open/close of a written file, close(-1), a "wt" and an "r" fopen
unsafe fn io_calls(args: &[OsString]) {
    let Some(dir) = args.first() else {
        usage();
    };
    let dir = Path::new(dir);
    let written = c_path(&dir.join("written.txt"));
    let netlist = c_path(&dir.join("netlist.net"));

    // Sits in the C stream's buffer until something flushes it
    let stdout: *mut *mut FILE = symbol(c"stdout");
    libc::fputs(c"HOST:buffered\n".as_ptr(), *stdout);

    let fd = libc::open(
        written.as_ptr(),
        libc::O_CREAT | libc::O_WRONLY | libc::O_TRUNC,
        0o644 as libc::c_uint,
    );
    libc::close(fd);
    libc::close(-1);

    let stream = libc::fopen(netlist.as_ptr(), c"wt".as_ptr());
    if !stream.is_null() {
        libc::fclose(stream);
    }
    let stream = libc::fopen(netlist.as_ptr(), c"r".as_ptr());
    if !stream.is_null() {
        libc::fclose(stream);
    }
}

unsafe fn pango_calls() {
    let set_text: SetTextFn = symbol(c"pango_layout_set_text");
    for text in [c"X", c"X", c"Y", c"X"] {
        set_text(ptr::null_mut(), text.as_ptr(), -1);
    }
}

unsafe fn chooser_call() {
    let get_filename: GetFilenameFn = symbol(c"gtk_file_chooser_get_filename");
    let free: FreeFn = symbol(c"g_free");
    let name = get_filename(ptr::null_mut());
    if name.is_null() {
        host_line("chooser", b"(null)");
        return;
    }
    host_line("chooser", CStr::from_ptr(name).to_bytes());
    free(name.cast());
}

unsafe fn print_call() {
    let run: PrintRunFn = symbol(c"gtk_print_operation_run");
    let result = run(
        ptr::null_mut(),
        PRINT_DIALOG,
        ptr::null_mut(),
        ptr::null_mut(),
    );
    host_line("print", result.to_string().as_bytes());
}

unsafe fn toolbar_calls() {
    let set_tooltip: SetTooltipFn = symbol(c"gtk_tool_item_set_tooltip");
    let set_tooltip_text: SetTooltipTextFn = symbol(c"gtk_tool_item_set_tooltip_text");
    let insert: ToolbarInsertFn = symbol(c"gtk_toolbar_insert");
    set_tooltip(
        ptr::null_mut(),
        ptr::null_mut(),
        c"Zoom in".as_ptr(),
        ptr::null(),
    );
    set_tooltip_text(ptr::null_mut(), c"Zoom out".as_ptr());
    insert(ptr::null_mut(), ptr::null_mut(), 3);
}
