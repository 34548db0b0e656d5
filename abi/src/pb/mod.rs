tonic::include_proto!("reservation");
