//! Vulkan context management
//!
//! Instance, physical device selection, logical device, and the long-lived
//! command pool. The context owns everything whose lifetime spans swapchain
//! rebuilds; swapchain-coupled resources live in `swapchain.rs`.

#[cfg(debug_assertions)]
use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::vk;
use ash::{Device, Entry, Instance};
use std::ffi::{CStr, CString};
use thiserror::Error;

use crate::render::window::WindowHandle;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No suitable memory type found for allocation
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// None of the requested formats are supported by the device
    #[error("No supported format among candidates")]
    NoSupportedFormat,

    /// A rebuilt swapchain came back with a different color or depth format,
    /// invalidating the render pass built against the old formats
    #[error("Swapchain image or depth format has changed")]
    SwapchainFormatChanged,
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    /// Debug utilities extension (debug builds)
    #[cfg(debug_assertions)]
    pub debug_utils: Option<DebugUtils>,
    /// Debug messenger handle (debug builds)
    #[cfg(debug_assertions)]
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanInstance {
    /// Create a new Vulkan instance, with validation layers in debug builds
    pub fn new(window: &WindowHandle, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to load Vulkan: {e:?}")))?;

        let app_name_cstr = CString::new(app_name)
            .map_err(|_| VulkanError::InitializationFailed("App name contains NUL".to_string()))?;
        let engine_name_cstr = CString::new("DaisyEngine")
            .map_err(|_| VulkanError::InitializationFailed("Engine name contains NUL".to_string()))?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        // Surface extensions come from GLFW
        let required_extensions = window
            .required_instance_extensions()
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to get required extensions: {e}")))?;

        let cstr_extensions: Vec<CString> = required_extensions
            .iter()
            .filter_map(|ext| CString::new(ext.as_str()).ok())
            .collect();

        #[allow(unused_mut)] // Mutable in debug builds for adding debug extensions
        let mut extensions: Vec<*const i8> =
            cstr_extensions.iter().map(|ext| ext.as_ptr()).collect();

        #[cfg(debug_assertions)]
        if enable_validation {
            extensions.push(DebugUtils::name().as_ptr());
        }

        let layer_names = if cfg!(debug_assertions) && enable_validation {
            vec![CString::new("VK_LAYER_KHRONOS_validation")
                .map_err(|_| VulkanError::InitializationFailed("Bad layer name".to_string()))?]
        } else {
            vec![]
        };

        let layer_names_ptrs: Vec<*const i8> =
            layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_names_ptrs);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        #[cfg(debug_assertions)]
        let (debug_utils, debug_messenger) = if enable_validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            let debug_messenger = Self::setup_debug_messenger(&debug_utils)?;
            (Some(debug_utils), Some(debug_messenger))
        } else {
            (None, None)
        };

        log::debug!("Vulkan instance created (validation: {enable_validation})");

        Ok(Self {
            entry,
            instance,
            #[cfg(debug_assertions)]
            debug_utils,
            #[cfg(debug_assertions)]
            debug_messenger,
        })
    }

    #[cfg(debug_assertions)]
    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            #[cfg(debug_assertions)]
            if let (Some(debug_utils), Some(debug_messenger)) =
                (&self.debug_utils, &self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(*debug_messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

/// Debug callback for validation layers
#[cfg(debug_assertions)]
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let callback_data = *callback_data;
    let message = CStr::from_ptr(callback_data.p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {message_type:?} - {message}");
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {message_type:?} - {message}");
    } else {
        log::debug!("[Vulkan] {message_type:?} - {message}");
    }

    vk::FALSE
}

/// Surface capabilities relevant to swapchain creation.
///
/// Queried fresh for every (re)build; capabilities go stale whenever the
/// window changes.
pub struct SwapchainSupport {
    /// Surface capabilities (extent bounds, image count bounds, transform)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported presentation modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// Physical device selection and capabilities
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Index of the graphics queue family
    pub graphics_family: u32,
    /// Index of the presentation queue family
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Select a suitable physical device for rendering
    pub fn select_suitable_device(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(VulkanError::Api)?
        };

        for device in devices {
            if let Ok(device_info) = Self::evaluate_device(instance, device, surface, surface_loader)
            {
                log::info!("Selected GPU: {}", unsafe {
                    CStr::from_ptr(device_info.properties.device_name.as_ptr()).to_string_lossy()
                });
                return Ok(device_info);
            }
        }

        Err(VulkanError::InitializationFailed(
            "No suitable GPU found".to_string(),
        ))
    }

    fn evaluate_device(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(device) };

        let mut graphics_family = None;
        let mut present_family = None;

        for (index, family) in queue_families.iter().enumerate() {
            let index = index as u32;

            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && graphics_family.is_none() {
                graphics_family = Some(index);
            }

            let present_support = unsafe {
                surface_loader
                    .get_physical_device_surface_support(device, index, surface)
                    .map_err(VulkanError::Api)?
            };

            if present_support && present_family.is_none() {
                present_family = Some(index);
            }

            if graphics_family.is_some() && present_family.is_some() {
                break;
            }
        }

        let graphics_family = graphics_family.ok_or_else(|| {
            VulkanError::InitializationFailed("No graphics queue family found".to_string())
        })?;

        let present_family = present_family.ok_or_else(|| {
            VulkanError::InitializationFailed("No present queue family found".to_string())
        })?;

        // Swapchain extension is mandatory
        let extensions = unsafe {
            instance
                .enumerate_device_extension_properties(device)
                .map_err(VulkanError::Api)?
        };

        let has_swapchain = extensions.iter().any(|available| {
            let extension_name = unsafe { CStr::from_ptr(available.extension_name.as_ptr()) };
            extension_name == SwapchainLoader::name()
        });

        if !has_swapchain {
            return Err(VulkanError::InitializationFailed(
                "Required device extensions not supported".to_string(),
            ));
        }

        // A device that cannot present anything is unusable
        let support = Self::query_swapchain_support(device, surface, surface_loader)?;
        if support.formats.is_empty() || support.present_modes.is_empty() {
            return Err(VulkanError::InitializationFailed(
                "Surface has no formats or present modes".to_string(),
            ));
        }

        Ok(Self {
            device,
            properties,
            graphics_family,
            present_family,
        })
    }

    /// Query current surface capabilities, formats, and present modes.
    pub fn query_swapchain_support(
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<SwapchainSupport> {
        let capabilities = unsafe {
            surface_loader
                .get_physical_device_surface_capabilities(device, surface)
                .map_err(VulkanError::Api)?
        };

        let formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(device, surface)
                .map_err(VulkanError::Api)?
        };

        let present_modes = unsafe {
            surface_loader
                .get_physical_device_surface_present_modes(device, surface)
                .map_err(VulkanError::Api)?
        };

        Ok(SwapchainSupport {
            capabilities,
            formats,
            present_modes,
        })
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue
    pub present_queue: vk::Queue,
    /// Index of the graphics queue family
    pub graphics_family: u32,
    /// Index of the presentation queue family
    pub present_family: u32,
    /// Swapchain extension loader
    pub swapchain_loader: SwapchainLoader,
}

impl LogicalDevice {
    /// Create a new logical device with graphics and present queues
    pub fn new(instance: &Instance, physical_device_info: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let unique_families: std::collections::HashSet<u32> = [
            physical_device_info.graphics_family,
            physical_device_info.present_family,
        ]
        .iter()
        .copied()
        .collect();

        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&[1.0])
                    .build()
            })
            .collect();

        let required_extensions = [SwapchainLoader::name().as_ptr()];
        let device_features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions)
            .enabled_features(&device_features);

        let device = unsafe {
            instance
                .create_device(physical_device_info.device, &create_info, None)
                .map_err(VulkanError::Api)?
        };

        let graphics_queue =
            unsafe { device.get_device_queue(physical_device_info.graphics_family, 0) };
        let present_queue =
            unsafe { device.get_device_queue(physical_device_info.present_family, 0) };

        let swapchain_loader = SwapchainLoader::new(instance, &device);

        log::debug!(
            "Logical device created (graphics family {}, present family {})",
            physical_device_info.graphics_family,
            physical_device_info.present_family
        );

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            graphics_family: physical_device_info.graphics_family,
            present_family: physical_device_info.present_family,
            swapchain_loader,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            // Ensure device is idle before destruction
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Main Vulkan context that owns all swapchain-independent resources
pub struct VulkanContext {
    command_pool: vk::CommandPool,
    surface: vk::SurfaceKHR,
    surface_loader: Surface,
    physical_device: PhysicalDeviceInfo,
    // Declaration order matters: device must drop before instance
    device: LogicalDevice,
    instance: VulkanInstance,
}

impl VulkanContext {
    /// Create a new Vulkan context for the window
    pub fn new(window: &mut WindowHandle, app_name: &str) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(window, app_name, cfg!(debug_assertions))?;

        let surface_loader = Surface::new(&instance.entry, &instance.instance);
        let surface = window
            .create_surface(instance.instance.handle())
            .map_err(|e| VulkanError::InitializationFailed(format!("Surface creation: {e}")))?;

        let physical_device =
            PhysicalDeviceInfo::select_suitable_device(&instance.instance, surface, &surface_loader)?;

        let device = LogicalDevice::new(&instance.instance, &physical_device)?;

        // One pool for the lifetime of the context; command buffers are reset
        // individually each frame
        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(device.graphics_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let command_pool = unsafe {
            device
                .device
                .create_command_pool(&pool_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            command_pool,
            surface,
            surface_loader,
            physical_device,
            device,
            instance,
        })
    }

    /// Get a reference to the Vulkan instance
    pub fn instance(&self) -> &Instance {
        &self.instance.instance
    }

    /// Get the surface handle
    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Get the surface loader
    pub fn surface_loader(&self) -> &Surface {
        &self.surface_loader
    }

    /// Get the physical device info
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Get the logical device wrapper
    pub fn device(&self) -> &LogicalDevice {
        &self.device
    }

    /// Get a clone of the raw device handle for RAII wrappers
    pub fn raw_device(&self) -> Device {
        self.device.device.clone()
    }

    /// Get the swapchain loader
    pub fn swapchain_loader(&self) -> &SwapchainLoader {
        &self.device.swapchain_loader
    }

    /// Get the graphics queue
    pub fn graphics_queue(&self) -> vk::Queue {
        self.device.graphics_queue
    }

    /// Get the present queue
    pub fn present_queue(&self) -> vk::Queue {
        self.device.present_queue
    }

    /// Get the command pool handle
    pub fn command_pool(&self) -> vk::CommandPool {
        self.command_pool
    }

    /// Query current swapchain support for the selected device and surface.
    pub fn query_swapchain_support(&self) -> VulkanResult<SwapchainSupport> {
        PhysicalDeviceInfo::query_swapchain_support(
            self.physical_device.device,
            self.surface,
            &self.surface_loader,
        )
    }

    /// Block until all queues on the device have drained.
    pub fn wait_idle(&self) -> VulkanResult<()> {
        unsafe {
            self.device
                .device
                .device_wait_idle()
                .map_err(VulkanError::Api)
        }
    }

    /// Allocate primary command buffers from the context pool.
    pub fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        unsafe {
            self.device
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(VulkanError::Api)
        }
    }

    /// Return command buffers to the context pool.
    pub fn free_command_buffers(&self, buffers: &[vk::CommandBuffer]) {
        unsafe {
            self.device
                .device
                .free_command_buffers(self.command_pool, buffers);
        }
    }

    /// Find a memory type index satisfying the filter and property flags.
    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<u32> {
        let mem_properties = unsafe {
            self.instance
                .instance
                .get_physical_device_memory_properties(self.physical_device.device)
        };

        for i in 0..mem_properties.memory_type_count {
            if (type_filter & (1 << i)) != 0
                && mem_properties.memory_types[i as usize]
                    .property_flags
                    .contains(properties)
            {
                return Ok(i);
            }
        }

        Err(VulkanError::NoSuitableMemoryType)
    }

    /// Find the first candidate format supporting the tiling and features.
    pub fn find_supported_format(
        &self,
        candidates: &[vk::Format],
        tiling: vk::ImageTiling,
        features: vk::FormatFeatureFlags,
    ) -> VulkanResult<vk::Format> {
        for &format in candidates {
            let props = unsafe {
                self.instance
                    .instance
                    .get_physical_device_format_properties(self.physical_device.device, format)
            };

            let supported = match tiling {
                vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
                vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
                _ => false,
            };

            if supported {
                return Ok(format);
            }
        }

        Err(VulkanError::NoSupportedFormat)
    }

    /// Find a depth attachment format supported by the device.
    pub fn find_depth_format(&self) -> VulkanResult<vk::Format> {
        self.find_supported_format(
            &[
                vk::Format::D32_SFLOAT,
                vk::Format::D32_SFLOAT_S8_UINT,
                vk::Format::D24_UNORM_S8_UINT,
            ],
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
        )
    }

    /// Begin a throwaway command buffer for a one-off transfer.
    pub fn begin_single_time_commands(&self) -> VulkanResult<vk::CommandBuffer> {
        let command_buffer = self.allocate_command_buffers(1)?[0];

        let begin_info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.device
                .device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;
        }

        Ok(command_buffer)
    }

    /// Submit and free a command buffer from `begin_single_time_commands`,
    /// waiting for the transfer to finish.
    pub fn end_single_time_commands(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        unsafe {
            self.device
                .device
                .end_command_buffer(command_buffer)
                .map_err(VulkanError::Api)?;

            let buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::builder().command_buffers(&buffers);

            self.device
                .device
                .queue_submit(self.device.graphics_queue, &[submit_info.build()], vk::Fence::null())
                .map_err(VulkanError::Api)?;
            self.device
                .device
                .queue_wait_idle(self.device.graphics_queue)
                .map_err(VulkanError::Api)?;
        }

        self.free_command_buffers(&[command_buffer]);
        Ok(())
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device.device_wait_idle();
            self.device
                .device
                .destroy_command_pool(self.command_pool, None);
            self.surface_loader.destroy_surface(self.surface, None);
        }
        // Remaining fields drop in declaration order: device before instance
    }
}
