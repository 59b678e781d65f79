//! Entity catalog for MQTT discovery
//!
//! One table entry per entity the bridge advertises. All sensors read
//! from the same retained state document through a value template.

/// One Home Assistant entity advertised via MQTT discovery
#[derive(Debug, Clone)]
pub struct EntityDef {
    /// Discovery component: "sensor" or "binary_sensor"
    pub component: &'static str,
    pub object_id: &'static str,
    pub name: &'static str,
    pub value_template: &'static str,
    pub device_class: Option<&'static str>,
    pub state_class: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub icon: Option<&'static str>,
    pub entity_category: Option<&'static str>,
}

impl EntityDef {
    const fn new(
        component: &'static str,
        object_id: &'static str,
        name: &'static str,
        value_template: &'static str,
    ) -> Self {
        Self {
            component,
            object_id,
            name,
            value_template,
            device_class: None,
            state_class: None,
            unit: None,
            icon: None,
            entity_category: None,
        }
    }

    const fn device_class(mut self, value: &'static str) -> Self {
        self.device_class = Some(value);
        self
    }

    const fn state_class(mut self, value: &'static str) -> Self {
        self.state_class = Some(value);
        self
    }

    const fn unit(mut self, value: &'static str) -> Self {
        self.unit = Some(value);
        self
    }

    const fn icon(mut self, value: &'static str) -> Self {
        self.icon = Some(value);
        self
    }

    const fn diagnostic(mut self) -> Self {
        self.entity_category = Some("diagnostic");
        self
    }
}

/// Every sensor and binary sensor the bridge advertises
pub const ENTITIES: &[EntityDef] = &[
    // Main readings
    EntityDef::new("sensor", "battery_12v", "Battery 12V", "{{ value_json.battery_12v_level }}")
        .device_class("battery")
        .state_class("measurement")
        .unit("%")
        .icon("mdi:car-battery"),
    EntityDef::new("sensor", "fuel_volume", "Fuel volume", "{{ value_json.fuel_volume }}")
        .device_class("volume")
        .unit("L")
        .icon("mdi:gas-station"),
    EntityDef::new("sensor", "mileage", "Mileage", "{{ value_json.mileage }}")
        .device_class("distance")
        .state_class("total_increasing")
        .unit("km")
        .icon("mdi:counter"),
    EntityDef::new("sensor", "fuel_range", "Fuel range", "{{ value_json.fuel_range }}")
        .device_class("distance")
        .state_class("measurement")
        .unit("km")
        .icon("mdi:map-marker-distance"),

    // Tires
    EntityDef::new("sensor", "tire_pressure_fl", "Tire pressure front left", "{{ value_json.tire_pressure_fl }}")
        .device_class("pressure")
        .state_class("measurement")
        .unit("kPa")
        .icon("mdi:car-tire-alert"),
    EntityDef::new("sensor", "tire_pressure_fr", "Tire pressure front right", "{{ value_json.tire_pressure_fr }}")
        .device_class("pressure")
        .state_class("measurement")
        .unit("kPa")
        .icon("mdi:car-tire-alert"),
    EntityDef::new("sensor", "tire_pressure_rl", "Tire pressure rear left", "{{ value_json.tire_pressure_rl }}")
        .device_class("pressure")
        .state_class("measurement")
        .unit("kPa")
        .icon("mdi:car-tire-alert"),
    EntityDef::new("sensor", "tire_pressure_rr", "Tire pressure rear right", "{{ value_json.tire_pressure_rr }}")
        .device_class("pressure")
        .state_class("measurement")
        .unit("kPa")
        .icon("mdi:car-tire-alert"),
    EntityDef::new("sensor", "tire_temp_fl", "Tire temperature front left", "{{ value_json.tire_temp_fl }}")
        .device_class("temperature")
        .state_class("measurement")
        .unit("°C")
        .icon("mdi:thermometer"),
    EntityDef::new("sensor", "tire_temp_fr", "Tire temperature front right", "{{ value_json.tire_temp_fr }}")
        .device_class("temperature")
        .state_class("measurement")
        .unit("°C")
        .icon("mdi:thermometer"),
    EntityDef::new("sensor", "tire_temp_rl", "Tire temperature rear left", "{{ value_json.tire_temp_rl }}")
        .device_class("temperature")
        .state_class("measurement")
        .unit("°C")
        .icon("mdi:thermometer"),
    EntityDef::new("sensor", "tire_temp_rr", "Tire temperature rear right", "{{ value_json.tire_temp_rr }}")
        .device_class("temperature")
        .state_class("measurement")
        .unit("°C")
        .icon("mdi:thermometer"),

    // Vehicle state
    EntityDef::new("sensor", "engine_state", "Engine state", "{{ value_json.engine_state }}")
        .icon("mdi:engine"),
    EntityDef::new("sensor", "sunroof", "Sunroof position", "{{ value_json.sunroof_position }}")
        .state_class("measurement")
        .unit("%")
        .icon("mdi:car-roof"),

    // Diagnostics
    EntityDef::new("sensor", "service_status", "Service status", "{{ value_json.service_status }}")
        .icon("mdi:car-connected")
        .diagnostic(),
    EntityDef::new("sensor", "signal_strength", "Signal strength", "{{ value_json.signal_strength }}")
        .state_class("measurement")
        .icon("mdi:signal")
        .diagnostic(),
    EntityDef::new("sensor", "last_update", "Last update", "{{ value_json.update_time }}")
        .device_class("timestamp")
        .icon("mdi:clock-outline")
        .diagnostic(),

    // Locks and doors
    EntityDef::new(
        "binary_sensor",
        "doors_unlocked",
        "Doors unlocked",
        "{{ 'ON' if value_json.doors_locked == false else 'OFF' }}",
    )
    .icon("mdi:car-door")
    .diagnostic(),
    EntityDef::new(
        "binary_sensor",
        "door_trunk",
        "Trunk",
        "{{ 'ON' if value_json.door_trunk else 'OFF' }}",
    )
    .device_class("door")
    .icon("mdi:car-back"),
    EntityDef::new(
        "binary_sensor",
        "door_front_left",
        "Door front left",
        "{{ 'ON' if value_json.door_front_left else 'OFF' }}",
    )
    .device_class("door")
    .icon("mdi:car-door"),
    EntityDef::new(
        "binary_sensor",
        "door_rear_left",
        "Door rear left",
        "{{ 'ON' if value_json.door_rear_left else 'OFF' }}",
    )
    .device_class("door")
    .icon("mdi:car-door"),
    EntityDef::new(
        "binary_sensor",
        "door_front_right",
        "Door front right",
        "{{ 'ON' if value_json.door_front_right else 'OFF' }}",
    )
    .device_class("door")
    .icon("mdi:car-door"),
    EntityDef::new(
        "binary_sensor",
        "door_rear_right",
        "Door rear right",
        "{{ 'ON' if value_json.door_rear_right else 'OFF' }}",
    )
    .device_class("door")
    .icon("mdi:car-door"),
    EntityDef::new(
        "binary_sensor",
        "hood",
        "Hood",
        "{{ 'ON' if value_json.hood else 'OFF' }}",
    )
    .device_class("door")
    .icon("mdi:car-outline"),

    // Climate and comfort
    EntityDef::new(
        "binary_sensor",
        "air_conditioner",
        "Air conditioner",
        "{{ 'ON' if value_json.air_conditioner else 'OFF' }}",
    )
    .device_class("running")
    .icon("mdi:air-conditioner"),

    // System
    EntityDef::new(
        "binary_sensor",
        "gps_authorized",
        "GPS authorized",
        "{{ 'ON' if value_json.gps_authorized else 'OFF' }}",
    )
    .device_class("connectivity")
    .icon("mdi:map-marker-check")
    .diagnostic(),
];
