// Domain and wire models

mod action;
mod auth;
mod container;
mod image;
mod system;

pub use action::{
    BatchBody, BatchItemResult, BatchResponse, BuildImageBody, BuildRequest, LogsResponse,
    MessageResponse, PortMapping, PullImageBody, RunContainerBody, RunContainerResponse,
    RunRequest, SENTINEL_IMAGES, VolumeMapping,
};
pub use auth::{AuthStatus, LoginRequest, LoginResponse, PublicUser, Session, User};
pub use container::{
    Container, ContainerCounts, ContainerResourceStats, ContainerState, StatsSample,
};
pub use image::Image;
pub use system::{
    CpuUsage, DockerDiskBlock, DockerResources, HostUsage, SystemSpecs, SystemStats, UsageBlock,
    percent_of,
};
