mod vehicle_position;
