//! Windows.Graphics.Capture single-frame acquisition (Windows 10 1803+).

use std::time::Duration;

use tracing::{debug, info};
use windows::{
    core::{IInspectable, Interface},
    Foundation::{EventRegistrationToken, TypedEventHandler},
    Graphics::{
        Capture::{
            Direct3D11CaptureFrame, Direct3D11CaptureFramePool, GraphicsCaptureItem,
            GraphicsCaptureSession,
        },
        DirectX::{Direct3D11::IDirect3DDevice, DirectXPixelFormat},
    },
    Win32::{
        Foundation::HMODULE,
        Graphics::{
            Direct3D::D3D_DRIVER_TYPE_HARDWARE,
            Direct3D11::{
                D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Texture2D,
                D3D11_CPU_ACCESS_READ, D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_MAPPED_SUBRESOURCE,
                D3D11_MAP_READ, D3D11_SDK_VERSION, D3D11_TEXTURE2D_DESC, D3D11_USAGE_STAGING,
            },
            Dxgi::IDXGIDevice,
            Gdi::HMONITOR,
        },
        System::WinRT::{
            Direct3D11::{CreateDirect3D11DeviceFromDXGIDevice, IDirect3DDxgiInterfaceAccess},
            Graphics::Capture::IGraphicsCaptureItemInterop,
            RoInitialize, RO_INIT_MULTITHREADED,
        },
    },
};

use super::{
    delivery::{self, FrameSender},
    AlphaMode, Coverage, FrameSource, PixelLayout, RawFrame,
};
use crate::{
    errors::AcquireError,
    monitor::{MonitorDetails, MonitorId},
    rect::PixelRect,
};

/// Full-monitor frame through WGC, bounded by a delivery timeout.
#[derive(Debug, Clone)]
pub struct AcceleratedSource {
    timeout: Duration,
}

impl AcceleratedSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl FrameSource for AcceleratedSource {
    fn name(&self) -> &'static str {
        "windows-graphics-capture"
    }

    fn acquire(
        &self,
        _rect: &PixelRect,
        monitor: &MonitorDetails,
    ) -> Result<RawFrame, AcquireError> {
        // No-op if WinRT is already initialised on this thread.
        unsafe {
            let _ = RoInitialize(RO_INIT_MULTITHREADED);
        }

        if !GraphicsCaptureSession::IsSupported().unwrap_or(false) {
            return Err(AcquireError::unavailable(
                "GraphicsCaptureSession is not supported on this system",
            ));
        }

        let device = GraphicsDevice::create()?;

        let item = create_item_for_monitor(monitor.id)?;
        let item_size = item.Size().map_err(AcquireError::platform)?;
        info!(
            "WGC capturing HMONITOR {:#x}, item {}x{}, bounds {}",
            monitor.id.0,
            item_size.Width,
            item_size.Height,
            monitor.bounds
        );

        let pool = Direct3D11CaptureFramePool::CreateFreeThreaded(
            &device.winrt,
            DirectXPixelFormat::B8G8R8A8UIntNormalized,
            1,
            item_size,
        )
        .map_err(|e| AcquireError::unavailable(format!("CreateFreeThreaded: {e}")))?;
        let mut guard = SessionGuard::new(pool);

        let session = guard
            .pool
            .CreateCaptureSession(&item)
            .map_err(|e| AcquireError::unavailable(format!("CreateCaptureSession: {e}")))?;
        // Windows 11 only; older builds always draw the border.
        let _ = session.SetIsBorderRequired(false);
        guard.session = Some(session.clone());

        let (sender, receiver) = delivery::channel();
        let handler = frame_arrived_handler(sender, device.d3d.clone());
        let token = guard
            .pool
            .FrameArrived(&handler)
            .map_err(AcquireError::platform)?;
        guard.token = Some(token);

        session.StartCapture().map_err(AcquireError::platform)?;
        debug!("WGC session started, waiting up to {:?}", self.timeout);
        let result = receiver.wait(self.timeout);
        drop(guard);

        if let Ok(frame) = &result {
            debug!(
                "WGC frame {}x{} stride {}",
                frame.width, frame.height, frame.stride
            );
        }
        result
    }
}

/// D3D11 device and the WinRT wrapper WGC needs.
struct GraphicsDevice {
    d3d: ID3D11Device,
    winrt: IDirect3DDevice,
}

impl GraphicsDevice {
    fn create() -> Result<Self, AcquireError> {
        let mut d3d: Option<ID3D11Device> = None;
        unsafe {
            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                HMODULE::default(),
                D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                None,
                D3D11_SDK_VERSION,
                Some(&mut d3d),
                None,
                None,
            )
        }
        .map_err(|e| AcquireError::unavailable(format!("D3D11CreateDevice: {e}")))?;

        let d3d =
            d3d.ok_or_else(|| AcquireError::unavailable("D3D11CreateDevice returned no device"))?;

        let dxgi: IDXGIDevice = d3d.cast().map_err(AcquireError::unavailable)?;
        let inspectable: IInspectable = unsafe { CreateDirect3D11DeviceFromDXGIDevice(&dxgi) }
            .map_err(|e| {
                AcquireError::unavailable(format!("CreateDirect3D11DeviceFromDXGIDevice: {e}"))
            })?;
        let winrt: IDirect3DDevice = inspectable.cast().map_err(AcquireError::unavailable)?;

        Ok(Self { d3d, winrt })
    }
}

/// Unregisters the frame handler and closes session and pool on every exit.
struct SessionGuard {
    pool: Direct3D11CaptureFramePool,
    session: Option<GraphicsCaptureSession>,
    token: Option<EventRegistrationToken>,
}

impl SessionGuard {
    fn new(pool: Direct3D11CaptureFramePool) -> Self {
        Self {
            pool,
            session: None,
            token: None,
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            if let Err(e) = self.pool.RemoveFrameArrived(token) {
                debug!("RemoveFrameArrived failed: {e}");
            }
        }
        if let Some(session) = self.session.take() {
            if let Err(e) = session.Close() {
                debug!("GraphicsCaptureSession::Close failed: {e}");
            }
        }
        if let Err(e) = self.pool.Close() {
            debug!("Direct3D11CaptureFramePool::Close failed: {e}");
        }
    }
}

fn create_item_for_monitor(id: MonitorId) -> Result<GraphicsCaptureItem, AcquireError> {
    let interop = windows::core::factory::<GraphicsCaptureItem, IGraphicsCaptureItemInterop>()
        .map_err(|e| AcquireError::unavailable(format!("IGraphicsCaptureItemInterop: {e}")))?;
    unsafe { interop.CreateForMonitor(HMONITOR(id.0 as *mut _)) }
        .map_err(|e| AcquireError::unavailable(format!("CreateForMonitor: {e}")))
}

/// The immediate context is not thread-safe, so only the device crosses into
/// the callback.
fn frame_arrived_handler(
    sender: FrameSender,
    device: ID3D11Device,
) -> TypedEventHandler<Direct3D11CaptureFramePool, IInspectable> {
    TypedEventHandler::new(
        move |pool: &Option<Direct3D11CaptureFramePool>, _: &Option<IInspectable>| {
            let Some(pool) = pool else { return Ok(()) };
            let frame = match pool.TryGetNextFrame() {
                Ok(frame) => frame,
                Err(_) => return Ok(()),
            };
            if !sender.is_resolved() {
                sender.deliver(read_frame(&device, &frame));
            }
            let _ = frame.Close();
            Ok(())
        },
    )
}

/// Copies the frame's GPU texture into a CPU-readable buffer.
fn read_frame(
    device: &ID3D11Device,
    frame: &Direct3D11CaptureFrame,
) -> Result<RawFrame, AcquireError> {
    let surface = frame.Surface().map_err(AcquireError::platform)?;
    let access: IDirect3DDxgiInterfaceAccess = surface.cast().map_err(AcquireError::platform)?;
    let texture: ID3D11Texture2D =
        unsafe { access.GetInterface() }.map_err(AcquireError::platform)?;

    let mut desc = D3D11_TEXTURE2D_DESC::default();
    unsafe { texture.GetDesc(&mut desc) };
    desc.Usage = D3D11_USAGE_STAGING;
    desc.BindFlags = 0;
    desc.CPUAccessFlags = D3D11_CPU_ACCESS_READ.0 as u32;
    desc.MiscFlags = 0;

    let mut staging: Option<ID3D11Texture2D> = None;
    unsafe { device.CreateTexture2D(&desc, None, Some(&mut staging)) }
        .map_err(AcquireError::platform)?;
    let staging =
        staging.ok_or_else(|| AcquireError::platform("CreateTexture2D returned no texture"))?;

    let mut context: Option<ID3D11DeviceContext> = None;
    unsafe { device.GetImmediateContext(&mut context) };
    let context =
        context.ok_or_else(|| AcquireError::platform("GetImmediateContext returned no context"))?;
    unsafe { context.CopyResource(&staging, &texture) };

    let mapped = MappedTexture::map(&context, &staging)?;
    let stride = mapped.subresource.RowPitch as usize;
    let len = stride * desc.Height as usize;
    let data =
        unsafe { std::slice::from_raw_parts(mapped.subresource.pData as *const u8, len) }.to_vec();
    drop(mapped);

    Ok(RawFrame {
        width: desc.Width,
        height: desc.Height,
        stride,
        layout: PixelLayout::Bgra8,
        alpha: AlphaMode::Premultiplied,
        coverage: Coverage::FullMonitor,
        data,
    })
}

/// CPU mapping of a staging texture, unmapped on drop.
struct MappedTexture<'a> {
    context: &'a ID3D11DeviceContext,
    texture: &'a ID3D11Texture2D,
    subresource: D3D11_MAPPED_SUBRESOURCE,
}

impl<'a> MappedTexture<'a> {
    fn map(
        context: &'a ID3D11DeviceContext,
        texture: &'a ID3D11Texture2D,
    ) -> Result<Self, AcquireError> {
        let mut subresource = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe { context.Map(texture, 0, D3D11_MAP_READ, 0, Some(&mut subresource)) }
            .map_err(AcquireError::platform)?;
        Ok(Self {
            context,
            texture,
            subresource,
        })
    }
}

impl Drop for MappedTexture<'_> {
    fn drop(&mut self) {
        unsafe { self.context.Unmap(self.texture, 0) };
    }
}
