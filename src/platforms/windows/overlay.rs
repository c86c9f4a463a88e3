//! Full-screen busy-overlay surfaces drawn as layered GDI windows.

use crate::errors::AutomationError;
use crate::platforms::OverlaySurface;
use tracing::debug;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, RECT, SIZE, WPARAM};
use windows::Win32::Graphics::Gdi::{
    CreateFontW, CreateSolidBrush, DeleteObject, DrawTextW, FillRect, GetDC,
    GetTextExtentPoint32W, ReleaseDC, SelectObject, SetBkMode, SetTextColor, DT_CENTER,
    DT_SINGLELINE, DT_VCENTER, HBRUSH, HDC, HGDIOBJ, TRANSPARENT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, GetClientRect, LoadCursorW, RegisterClassExW,
    SetLayeredWindowAttributes, ShowWindow, HICON, IDC_ARROW, LWA_ALPHA, SW_SHOWNOACTIVATE,
    WM_DESTROY, WNDCLASSEXW, WNDCLASS_STYLES, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW,
    WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};

const OVERLAY_CLASS_NAME: PCWSTR = w!("AutomatorBusyOverlay");

/// Alpha of the translucent panel (0 = invisible, 255 = opaque).
const PANEL_ALPHA: u8 = 160;

/// One overlay surface per connected display.
pub(super) fn create_surfaces() -> Result<Vec<Box<dyn OverlaySurface>>, AutomationError> {
    let monitors = xcap::Monitor::all().map_err(|e| {
        AutomationError::PlatformError(format!("failed to enumerate displays: {e}"))
    })?;
    let mut surfaces: Vec<Box<dyn OverlaySurface>> = Vec::with_capacity(monitors.len());
    for monitor in monitors {
        let x = monitor
            .x()
            .map_err(|e| AutomationError::PlatformError(format!("display geometry: {e}")))?;
        let y = monitor
            .y()
            .map_err(|e| AutomationError::PlatformError(format!("display geometry: {e}")))?;
        let width = monitor
            .width()
            .map_err(|e| AutomationError::PlatformError(format!("display geometry: {e}")))?;
        let height = monitor
            .height()
            .map_err(|e| AutomationError::PlatformError(format!("display geometry: {e}")))?;
        surfaces.push(Box::new(GdiOverlaySurface::create(x, y, width, height)?));
    }
    debug!("created {} overlay surfaces", surfaces.len());
    Ok(surfaces)
}

struct GdiOverlaySurface {
    hwnd: HWND,
    width: u32,
    height: u32,
    hdc: Option<HDC>,
}

// The HWND is a plain handle; the surface set is only driven from the
// automation thread that owns the overlay lock.
unsafe impl Send for GdiOverlaySurface {}

impl GdiOverlaySurface {
    fn create(x: i32, y: i32, width: u32, height: u32) -> Result<Self, AutomationError> {
        unsafe {
            let instance = GetModuleHandleW(None).map_err(|e| {
                AutomationError::PlatformError(format!("GetModuleHandleW failed: {e}"))
            })?;

            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                style: WNDCLASS_STYLES(0),
                lpfnWndProc: Some(overlay_window_proc),
                cbClsExtra: 0,
                cbWndExtra: 0,
                hInstance: instance.into(),
                hIcon: HICON::default(),
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                hbrBackground: HBRUSH::default(),
                lpszMenuName: PCWSTR::null(),
                lpszClassName: OVERLAY_CLASS_NAME,
                hIconSm: HICON::default(),
            };
            let atom = RegisterClassExW(&wc);
            if atom == 0 {
                debug!("RegisterClassExW returned 0 (class may already exist)");
            }

            // Layered + transparent + no-activate: visible everywhere but
            // never a click target and never focused.
            let hwnd = CreateWindowExW(
                WS_EX_LAYERED
                    | WS_EX_TRANSPARENT
                    | WS_EX_TOPMOST
                    | WS_EX_TOOLWINDOW
                    | WS_EX_NOACTIVATE,
                OVERLAY_CLASS_NAME,
                w!("Busy Overlay"),
                WS_POPUP,
                x,
                y,
                width as i32,
                height as i32,
                None,
                None,
                Some(instance.into()),
                None,
            )
            .map_err(|e| AutomationError::PlatformError(format!("CreateWindowExW failed: {e}")))?;

            if hwnd.is_invalid() {
                return Err(AutomationError::PlatformError(
                    "CreateWindowExW returned invalid HWND".to_string(),
                ));
            }

            SetLayeredWindowAttributes(hwnd, COLORREF(0), PANEL_ALPHA, LWA_ALPHA).map_err(
                |e| {
                    AutomationError::PlatformError(format!(
                        "SetLayeredWindowAttributes failed: {e}"
                    ))
                },
            )?;

            let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);

            Ok(Self {
                hwnd,
                width,
                height,
                hdc: None,
            })
        }
    }
}

impl OverlaySurface for GdiOverlaySurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn text_width(&self, text: &str, point_size: u32) -> u32 {
        unsafe {
            let hdc = GetDC(Some(self.hwnd));
            if hdc.is_invalid() {
                return 0;
            }
            let font = create_status_font(point_size);
            let old_font = SelectObject(hdc, HGDIOBJ(font.0));
            let wide: Vec<u16> = text.encode_utf16().collect();
            let mut extent = SIZE::default();
            let ok = GetTextExtentPoint32W(hdc, &wide, &mut extent).as_bool();
            SelectObject(hdc, old_font);
            let _ = DeleteObject(HGDIOBJ(font.0));
            let _ = ReleaseDC(Some(self.hwnd), hdc);
            if ok {
                extent.cx.max(0) as u32
            } else {
                0
            }
        }
    }

    fn begin_redraw(&mut self) {
        unsafe {
            let hdc = GetDC(Some(self.hwnd));
            if !hdc.is_invalid() {
                self.hdc = Some(hdc);
            }
        }
    }

    fn fill(&mut self, color: u32) -> Result<(), AutomationError> {
        let hdc = self.device_context()?;
        unsafe {
            let brush = CreateSolidBrush(COLORREF(color));
            let mut rect = RECT::default();
            let _ = GetClientRect(self.hwnd, &mut rect);
            let _ = FillRect(hdc, &rect, brush);
            let _ = DeleteObject(brush.into());
        }
        Ok(())
    }

    fn draw_text_centered(
        &mut self,
        text: &str,
        point_size: u32,
        color: u32,
    ) -> Result<(), AutomationError> {
        let hdc = self.device_context()?;
        unsafe {
            let font = create_status_font(point_size);
            let old_font = SelectObject(hdc, HGDIOBJ(font.0));
            SetTextColor(hdc, COLORREF(color));
            SetBkMode(hdc, TRANSPARENT);

            let mut wide: Vec<u16> = text.encode_utf16().collect();
            let mut rect = RECT::default();
            let _ = GetClientRect(self.hwnd, &mut rect);
            let _ = DrawTextW(hdc, &mut wide, &mut rect, DT_CENTER | DT_VCENTER | DT_SINGLELINE);

            SelectObject(hdc, old_font);
            let _ = DeleteObject(HGDIOBJ(font.0));
        }
        Ok(())
    }

    fn end_redraw(&mut self) {
        if let Some(hdc) = self.hdc.take() {
            unsafe {
                let _ = ReleaseDC(Some(self.hwnd), hdc);
            }
        }
    }
}

impl GdiOverlaySurface {
    fn device_context(&self) -> Result<HDC, AutomationError> {
        self.hdc.ok_or_else(|| {
            AutomationError::PlatformError("draw outside begin_redraw/end_redraw".to_string())
        })
    }
}

impl Drop for GdiOverlaySurface {
    fn drop(&mut self) {
        self.end_redraw();
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

fn create_status_font(point_size: u32) -> windows::Win32::Graphics::Gdi::HFONT {
    unsafe {
        CreateFontW(
            point_size as i32,
            0,
            0,
            0,
            700,
            0,
            0,
            0,
            windows::Win32::Graphics::Gdi::FONT_CHARSET(1),
            windows::Win32::Graphics::Gdi::FONT_OUTPUT_PRECISION(0),
            windows::Win32::Graphics::Gdi::FONT_CLIP_PRECISION(0),
            windows::Win32::Graphics::Gdi::FONT_QUALITY(0),
            0,
            PCWSTR::null(),
        )
    }
}

/// Minimal window procedure. The surface has no paint loop of its own; it
/// stays frozen with whatever the coordinator last drew.
unsafe extern "system" fn overlay_window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_DESTROY => LRESULT(0),
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
