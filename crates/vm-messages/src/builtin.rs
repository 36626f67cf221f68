//! Built-in English templates.

/// (key, template) pairs shipped with the catalog.
pub const BUILTIN_MESSAGES: &[(&str, &str)] = &[
    ("vm.box_missing", "A box must be specified."),
    (
        "vm.box_not_found",
        "The box '%{name}' could not be found.",
    ),
    (
        "vm.base_mac_invalid",
        "Base MAC address for eth0/NAT must be set. Contact box maintainer for more information.",
    ),
    (
        "vm.shared_folder_hostpath_missing",
        "Shared folder host path for '%{name}' doesn't exist: %{path}",
    ),
    (
        "vm.shared_folder_nfs_owner_group",
        "Shared folder '%{name}': owner/group not supported with NFS.",
    ),
    (
        "vm.network_ip_required",
        "Host only networks require an IP as an argument.",
    ),
    (
        "vm.network_ip_invalid",
        "The host only network IP '%{ip}' is invalid.",
    ),
    (
        "vm.network_ip_ends_one",
        "The host only network IP '%{ip}' must not end in a 1, as this is reserved for the host machine.",
    ),
    (
        "vm.network_invalid",
        "Networks of type '%{type}' are not valid.",
    ),
    (
        "vm.provisioner_not_found",
        "The provisioner '%{name}' doesn't exist.",
    ),
    (
        "provisioners.shell.path_and_inline_set",
        "Only one of `path` or `inline` may be set.",
    ),
    (
        "provisioners.shell.no_path_or_inline",
        "One of `path` or `inline` must be set.",
    ),
    (
        "provisioners.shell.path_invalid",
        "`path` for shell provisioner does not exist on the host system: %{path}",
    ),
    (
        "provisioners.shell.args_must_be_string",
        "Shell provisioner `args` must be a string.",
    ),
    (
        "provisioners.file.no_source",
        "File provisioner source must be specified.",
    ),
    (
        "provisioners.file.no_destination",
        "File provisioner destination must be specified.",
    ),
];
